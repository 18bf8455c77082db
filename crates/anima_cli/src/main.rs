use std::io::Write;
use std::path::Path;

use anima_driver::{Driver, MemberFileName, load_pack, pack_program};
use anima_runtime::{BufferHooks, Engine};
use anima_syntax::{SourceFile, SourceId, Symbol, render_diagnostic};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const USAGE: &str =
    "Usage: anima <tokens|ast|check|run|pack> [--ticks N] [--delta S] [--invoke Class.member] <args>";

fn main() {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();
    let Some(cmd) = argv.first().cloned() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    argv.remove(0);
    let mut ticks: u32 = 0;
    let mut delta: f32 = 0.5;
    let mut invoke = String::from("Main.main");
    let mut positional: Vec<String> = Vec::new();

    let mut i = 0;
    while i < argv.len() {
        let a = &argv[i];
        if a == "--ticks" {
            i += 1;
            ticks = argv.get(i).and_then(|v| v.parse().ok()).unwrap_or_else(|| {
                eprintln!("--ticks needs a number");
                std::process::exit(2);
            });
        } else if a == "--delta" {
            i += 1;
            delta = argv.get(i).and_then(|v| v.parse().ok()).unwrap_or_else(|| {
                eprintln!("--delta needs a number");
                std::process::exit(2);
            });
        } else if a == "--invoke" {
            i += 1;
            invoke = argv.get(i).cloned().unwrap_or_else(|| {
                eprintln!("--invoke needs Class.member");
                std::process::exit(2);
            });
        } else {
            positional.push(a.clone());
        }
        i += 1;
    }

    match cmd.as_str() {
        "tokens" => {
            let path = one_arg(&positional);
            let input = read_file(path);
            let lex = anima_lexer::Lexer::new(&input).lex();
            let mut out = std::io::stdout().lock();
            for t in &lex.tokens {
                let text = &input[t.span.start.0 as usize..t.span.end.0 as usize];
                if let Err(e) = writeln!(out, "{:?}\t{:?}\t{}", t.kind, t.span, escape_visible(text))
                {
                    if e.kind() == std::io::ErrorKind::BrokenPipe {
                        return;
                    }
                    eprintln!("stdout error: {e}");
                    std::process::exit(2);
                }
            }
            let source = SourceFile::new(SourceId(0), path.to_string(), input.clone());
            for d in &lex.diagnostics {
                eprintln!("{}", render_diagnostic(&source, d));
            }
        }
        "ast" => {
            let path = one_arg(&positional);
            let input = read_file(path);
            let file_name = Path::new(path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(path);
            let Some(MemberFileName::Member { name, kind }) = MemberFileName::parse(file_name)
            else {
                eprintln!("not a member file: {file_name}");
                std::process::exit(2);
            };
            let (def, diagnostics) = anima_parser::compile_member(
                &input,
                Symbol::intern(&name),
                kind,
                Symbol::intern("Object"),
                &anima_parser::NullScope,
                true,
            );
            let source = SourceFile::new(SourceId(0), path.to_string(), input);
            for d in &diagnostics {
                eprintln!("{}", render_diagnostic(&source, d));
            }
            if let Some(def) = def {
                println!("{def:#?}");
            }
            if diagnostics.iter().any(|d| d.is_error()) {
                std::process::exit(1);
            }
        }
        "check" => {
            let path = one_arg(&positional);
            let mut engine = Engine::with_hooks(Box::new(BufferHooks::default()));
            let report = match Driver::load_tree(&mut engine, Path::new(path)) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
            };
            render_report(&report);
            if report.has_errors() {
                std::process::exit(1);
            }
        }
        "run" => {
            let path = one_arg(&positional);
            let mut engine = Engine::with_hooks(Box::new(BufferHooks::default()));
            if path.ends_with(".anb") {
                let bytes = match std::fs::read(path) {
                    Ok(b) => b,
                    Err(e) => {
                        eprintln!("Failed to read {path}: {e}");
                        std::process::exit(2);
                    }
                };
                if let Err(e) = load_pack(&mut engine, &bytes) {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
            } else {
                let report = match Driver::load_tree(&mut engine, Path::new(path)) {
                    Ok(r) => r,
                    Err(e) => {
                        eprintln!("{e}");
                        std::process::exit(2);
                    }
                };
                render_report(&report);
                if report.has_errors() {
                    std::process::exit(1);
                }
            }
            run_entry(&mut engine, &invoke, ticks, delta);
        }
        "pack" => {
            if positional.len() != 2 {
                eprintln!("Usage: anima pack <dir> <out.anb>");
                std::process::exit(2);
            }
            let mut engine = Engine::with_hooks(Box::new(BufferHooks::default()));
            let report = match Driver::load_tree(&mut engine, Path::new(&positional[0])) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(2);
                }
            };
            render_report(&report);
            if report.has_errors() {
                std::process::exit(1);
            }
            let blob = pack_program(&engine);
            if let Err(e) = std::fs::write(&positional[1], blob) {
                eprintln!("Failed to write {}: {e}", positional[1]);
                std::process::exit(2);
            }
        }
        _ => {
            eprintln!("Unknown command: {cmd}");
            std::process::exit(2);
        }
    }
}

fn run_entry(engine: &mut Engine, invoke: &str, ticks: u32, delta: f32) {
    let Some((class, member)) = invoke.split_once('.') else {
        eprintln!("--invoke expects Class.member");
        std::process::exit(2);
    };
    let class = Symbol::intern(class);
    let member = Symbol::intern(member);

    let result = if member.as_str().starts_with('_') {
        // Coroutine entry: run on a fresh actor when the class is one,
        // otherwise on a plain instance, then drive the tick loop.
        let receiver = if engine
            .brain()
            .find_class(class)
            .map(|c| engine.brain().class(c).is_actor)
            .unwrap_or(false)
        {
            engine.spawn_actor(class, None)
        } else {
            engine.instantiate(class, vec![])
        };
        match receiver {
            Ok(r) => engine.start_coroutine(r, member, vec![]).map(|_| ()),
            Err(e) => Err(e),
        }
    } else {
        match engine.instantiate(class, vec![]) {
            Ok(r) => engine.invoke(r, member, vec![]).map(|_| ()),
            Err(e) => Err(e),
        }
    };

    for _ in 0..ticks {
        engine.update(delta);
    }

    let output = engine.take_output();
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "{output}");

    if let Err(e) = result {
        eprintln!("RuntimeError: {e}");
        std::process::exit(1);
    }
    for e in engine.take_errors() {
        eprintln!("RuntimeError: {e}");
    }
}

fn render_report(report: &anima_driver::LoadReport) {
    for e in &report.errors {
        eprintln!("{e}");
    }
    for (path, d) in &report.diagnostics {
        let text = std::fs::read_to_string(path).unwrap_or_default();
        let source = SourceFile::new(SourceId(0), path.display().to_string(), text);
        eprintln!("{}", render_diagnostic(&source, d));
    }
}

fn one_arg(positional: &[String]) -> &str {
    match positional.first() {
        Some(p) => p.as_str(),
        None => {
            eprintln!("Missing <path>");
            std::process::exit(2);
        }
    }
}

fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {path}: {e}");
            std::process::exit(2);
        }
    }
}

fn escape_visible(s: &str) -> String {
    let mut out = String::new();
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
