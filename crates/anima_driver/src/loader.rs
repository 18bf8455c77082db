//! Class-tree source loader.
//!
//! One directory per class, nested the way the hierarchy nests; one text
//! file per member:
//!
//! ```text
//! scripts/
//!   Actor/
//!     Guard/
//!       !data.an        instance/class data declarations
//!       !().an          constructor
//!       speak().an      method
//!       rally()C.an     class method
//!       _patrol().an    coroutine
//! ```
//!
//! A top-level directory whose name matches an already-registered class
//! (e.g. `Actor`) contributes members to it instead of declaring a new
//! class. Parse errors in one member never block the rest of its class.
use std::fs;
use std::path::{Path, PathBuf};

use anima_ir::{DataDef, MemberKind};
use anima_runtime::Engine;
use anima_syntax::{Diagnostic, Symbol};

pub struct LoadReport {
    pub classes: usize,
    pub members: usize,
    /// Diagnostics tagged with the file they came from.
    pub diagnostics: Vec<(PathBuf, Diagnostic)>,
    pub errors: Vec<String>,
}

impl LoadReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.diagnostics.iter().any(|(_, d)| d.is_error())
    }
}

/// A member file name decomposed: `_patrol().an` → coroutine `_patrol`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberFileName {
    Data,
    Member { name: String, kind: MemberKind },
}

impl MemberFileName {
    pub fn parse(file_name: &str) -> Option<MemberFileName> {
        let stem = file_name.strip_suffix(".an")?;
        if stem == "!data" {
            return Some(MemberFileName::Data);
        }
        if let Some(name) = stem.strip_suffix("()C") {
            return Some(MemberFileName::Member {
                name: name.to_string(),
                kind: MemberKind::ClassMethod,
            });
        }
        let name = stem.strip_suffix("()")?;
        let kind = if name.starts_with('_') {
            MemberKind::Coroutine
        } else {
            MemberKind::Method
        };
        Some(MemberFileName::Member {
            name: name.to_string(),
            kind,
        })
    }
}

pub struct Driver;

impl Driver {
    /// Load a class tree into the engine: first pass registers classes and
    /// data layouts, second pass compiles members against the complete
    /// registry.
    pub fn load_tree(engine: &mut Engine, root: &Path) -> std::io::Result<LoadReport> {
        let mut report = LoadReport {
            classes: 0,
            members: 0,
            diagnostics: Vec::new(),
            errors: Vec::new(),
        };
        let mut class_dirs: Vec<(Symbol, PathBuf)> = Vec::new();
        Self::register_classes(engine, root, None, &mut class_dirs, &mut report)?;
        for (class, dir) in &class_dirs {
            Self::load_data_file(engine, *class, dir, &mut report)?;
        }
        for (class, dir) in &class_dirs {
            Self::load_members(engine, *class, dir, &mut report)?;
        }
        Ok(report)
    }

    fn register_classes(
        engine: &mut Engine,
        dir: &Path,
        parent: Option<Symbol>,
        class_dirs: &mut Vec<(Symbol, PathBuf)>,
        report: &mut LoadReport,
    ) -> std::io::Result<()> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        entries.sort();
        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let class = Symbol::intern(name);
            if engine.brain().find_class(class).is_none() {
                match engine.add_class(class, parent) {
                    Ok(_) => report.classes += 1,
                    Err(e) => {
                        report.errors.push(format!("{}: {}", path.display(), e));
                        continue;
                    }
                }
            }
            class_dirs.push((class, path.clone()));
            Self::register_classes(engine, &path, Some(class), class_dirs, report)?;
        }
        Ok(())
    }

    fn load_data_file(
        engine: &mut Engine,
        class: Symbol,
        dir: &Path,
        report: &mut LoadReport,
    ) -> std::io::Result<()> {
        let path = dir.join("!data.an");
        if !path.exists() {
            return Ok(());
        }
        let text = fs::read_to_string(&path)?;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let (is_class_data, rest) = match line.strip_prefix("static ") {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let (name, ty) = match rest.split_once(':') {
                Some((n, t)) => {
                    let (ty, diags) = anima_parser::parse_type_text(t.trim());
                    for d in diags {
                        report.diagnostics.push((path.clone(), d));
                    }
                    (n.trim(), ty)
                }
                None => (rest, None),
            };
            let def = DataDef {
                name: Symbol::intern(name),
                ty,
                is_class_data,
            };
            let added = if is_class_data {
                engine.add_class_data(class, &def).map(|_| 0)
            } else {
                engine.add_instance_data(class, &def).map(|_| 0)
            };
            if let Err(e) = added {
                report.errors.push(format!("{}: {}", path.display(), e));
            }
        }
        Ok(())
    }

    fn load_members(
        engine: &mut Engine,
        class: Symbol,
        dir: &Path,
        report: &mut LoadReport,
    ) -> std::io::Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let parsed = match MemberFileName::parse(file_name) {
                Some(MemberFileName::Member { name, kind }) => (name, kind),
                Some(MemberFileName::Data) | None => continue,
            };
            let (name, kind) = parsed;
            let source = fs::read_to_string(&path)?;
            match engine.load_member(class, Symbol::intern(&name), kind, &source) {
                Ok(diags) => {
                    report.members += 1;
                    for d in diags {
                        report.diagnostics.push((path.clone(), d));
                    }
                }
                Err(e) => report.errors.push(format!("{}: {}", path.display(), e)),
            }
        }
        Ok(())
    }
}
