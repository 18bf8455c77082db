//! Packed binary program form.
//!
//! One blob carries the whole scripted class hierarchy: class rows, data
//! layouts and compiled member trees. Deployment loads this instead of the
//! source tree; the round-trip contract is that a loaded pack evaluates
//! identically to the freshly compiled sources.
use anima_ir::{
    BinError, ByteReader, ByteWriter, DataDef, decode_data_def, decode_member, encode_data_def,
    encode_member,
};
use anima_runtime::{Engine, InvokableBody};
use anima_syntax::Symbol;

const MAGIC: &[u8; 4] = b"ANPK";
const VERSION: u16 = 1;

#[derive(Debug)]
pub enum PackError {
    BadMagic,
    BadVersion(u16),
    Bin(BinError),
    Class(String),
}

impl std::fmt::Display for PackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackError::BadMagic => write!(f, "not a packed program"),
            PackError::BadVersion(v) => write!(f, "unsupported pack version {v}"),
            PackError::Bin(e) => write!(f, "corrupt pack: {e}"),
            PackError::Class(msg) => write!(f, "class setup failed: {msg}"),
        }
    }
}

impl std::error::Error for PackError {}

impl From<BinError> for PackError {
    fn from(e: BinError) -> Self {
        PackError::Bin(e)
    }
}

/// Serialize every scripted class and member in registration order. Native
/// members are re-bound by the embedding at startup and are not packed.
pub fn pack_program(engine: &Engine) -> Vec<u8> {
    let brain = engine.brain();
    let mut w = ByteWriter::new();
    w.bytes(MAGIC);
    w.u16(VERSION);

    let ids: Vec<_> = brain.class_ids().collect();
    w.u32(ids.len() as u32);
    for id in ids {
        let class = brain.class(id);
        w.sym(class.name);
        match class.superclass {
            Some(sup) => {
                w.bool(true);
                w.sym(brain.class(sup).name);
            }
            None => w.bool(false),
        }

        w.u16((class.own_data.len() + class.class_data.len()) as u16);
        for slot in class.own_data.values() {
            let def = DataDef {
                name: slot.name,
                ty: slot.ty.clone(),
                is_class_data: false,
            };
            encode_data_def(&def, &mut w);
        }
        for slot in class.class_data.values() {
            let def = DataDef {
                name: slot.name,
                ty: slot.ty.clone(),
                is_class_data: true,
            };
            encode_data_def(&def, &mut w);
        }

        let mut members: Vec<&anima_runtime::Invokable> = Vec::new();
        members.extend(class.methods.values());
        members.extend(class.coroutines.values());
        members.extend(class.class_methods.values());
        let scripted: Vec<_> = members
            .into_iter()
            .filter_map(|inv| match &inv.body {
                InvokableBody::Code(def) => Some(def.clone()),
                _ => None,
            })
            .collect();
        w.u32(scripted.len() as u32);
        for def in scripted {
            encode_member(&def, &mut w);
        }
    }
    w.into_bytes()
}

/// Load a packed program into an engine. Classes already present (the core
/// ones, or a host's natives) are reused; everything else registers fresh.
pub fn load_pack(engine: &mut Engine, bytes: &[u8]) -> Result<(), PackError> {
    let mut r = ByteReader::new(bytes);
    let mut magic = [0u8; 4];
    for b in &mut magic {
        *b = r.u8()?;
    }
    if &magic != MAGIC {
        return Err(PackError::BadMagic);
    }
    let version = r.u16()?;
    if version != VERSION {
        return Err(PackError::BadVersion(version));
    }

    let class_count = r.u32()? as usize;
    for _ in 0..class_count {
        let name = r.sym()?;
        let superclass = if r.bool()? { Some(r.sym()?) } else { None };
        if engine.brain().find_class(name).is_none() {
            engine
                .add_class(name, superclass)
                .map_err(|e| PackError::Class(e.to_string()))?;
        }

        let data_count = r.u16()? as usize;
        for _ in 0..data_count {
            let def = decode_data_def(&mut r)?;
            if def.is_class_data {
                if !has_class_data(engine, name, def.name) {
                    engine
                        .add_class_data(name, &def)
                        .map_err(|e| PackError::Class(e.to_string()))?;
                }
            } else if !has_instance_data(engine, name, def.name) {
                engine
                    .add_instance_data(name, &def)
                    .map_err(|e| PackError::Class(e.to_string()))?;
            }
        }

        let member_count = r.u32()? as usize;
        for _ in 0..member_count {
            let def = decode_member(&mut r)?;
            let cid = engine
                .brain()
                .find_class(name)
                .ok_or_else(|| PackError::Class(format!("class {name} vanished")))?;
            engine.install_member(cid, def);
        }
    }
    Ok(())
}

fn has_instance_data(engine: &Engine, class: Symbol, name: Symbol) -> bool {
    let brain = engine.brain();
    brain
        .find_class(class)
        .and_then(|cid| brain.find_data_slot(cid, name))
        .is_some()
}

fn has_class_data(engine: &Engine, class: Symbol, name: Symbol) -> bool {
    let brain = engine.brain();
    brain
        .find_class(class)
        .and_then(|cid| brain.find_class_data(cid, name))
        .is_some()
}
