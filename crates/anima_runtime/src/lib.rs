//!
//!
//!
//!
mod brain;
mod builtins;
mod class;
mod engine;
mod errors;
mod eval;
mod frame;
mod hooks;
mod instance;
mod invokable;
mod mind;
mod pool;
pub mod remote;

pub use brain::Brain;
pub use class::{Class, ClassId, ClassSpec, DataSlot, InvokableClassSpec, TypedClassSpec};
pub use engine::{CoreClasses, DebugEvent, Engine, EngineConfig};
pub use errors::{ClassError, RuntimeError, RuntimeErrorKind, messages};
pub use frame::{CoroStatus, Frame, FrameId, PendingDst, Wake};
pub use hooks::{AppHooks, BufferHooks, ErrorDecision, StdHooks};
pub use instance::{ClosureData, Instance, InstanceData, InstanceId, NIL};
pub use invokable::{CoroNative, Invokable, InvokableBody, NativeCoroutine, NativeMethod};
pub use mind::{MASTER_MIND, Mind, MindId};
pub use pool::{PoolStats, round_pow2};
pub use remote::RemoteSession;
