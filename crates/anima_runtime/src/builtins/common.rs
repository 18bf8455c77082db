//! Argument helpers shared by the native members.
use anima_syntax::Symbol;

use crate::engine::Engine;
use crate::errors::{RuntimeError, RuntimeErrorKind, messages};
use crate::frame::FrameId;
use crate::instance::{InstanceData, InstanceId, NIL};

impl Engine {
    /// Borrow argument `i` of a native call (frame slot `i`). No retain: the
    /// frame keeps its reference alive for the duration of the native.
    pub fn arg(&self, fid: FrameId, i: u16) -> InstanceId {
        self.frames.get(fid).map(|f| f.local(i)).unwrap_or(NIL)
    }

    pub fn native_receiver(&self, fid: FrameId) -> InstanceId {
        self.frames.get(fid).map(|f| f.receiver).unwrap_or(NIL)
    }

    pub fn arg_i64(&self, fid: FrameId, i: u16) -> Result<i64, RuntimeError> {
        match &self.instance(self.arg(fid, i)).data {
            InstanceData::Integer(v) => Ok(*v),
            _ => Err(RuntimeError::new(
                RuntimeErrorKind::ArgumentType,
                messages::NOT_A_NUMBER,
            )),
        }
    }

    /// Integer or Real argument as f32.
    pub fn arg_f32(&self, fid: FrameId, i: u16) -> Result<f32, RuntimeError> {
        match &self.instance(self.arg(fid, i)).data {
            InstanceData::Integer(v) => Ok(*v as f32),
            InstanceData::Real(v) => Ok(*v),
            _ => Err(RuntimeError::new(
                RuntimeErrorKind::ArgumentType,
                messages::NOT_A_NUMBER,
            )),
        }
    }

    pub fn arg_str(&self, fid: FrameId, i: u16) -> Result<String, RuntimeError> {
        match &self.instance(self.arg(fid, i)).data {
            InstanceData::Str(s) => Ok(s.to_string()),
            _ => Err(RuntimeError::new(
                RuntimeErrorKind::ArgumentType,
                "expected a String",
            )),
        }
    }

    pub fn arg_sym(&self, fid: FrameId, i: u16) -> Result<Symbol, RuntimeError> {
        match &self.instance(self.arg(fid, i)).data {
            InstanceData::Sym(s) => Ok(*s),
            _ => Err(RuntimeError::new(
                RuntimeErrorKind::ArgumentType,
                "expected a Symbol",
            )),
        }
    }
}
