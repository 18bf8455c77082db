//!
//!
mod binary;
mod expr;
mod member;
mod params;
mod types;

pub use binary::{
    BinError, ByteReader, ByteWriter, decode_code, decode_data_def, decode_expr, decode_member,
    decode_params, decode_type, encode_code, encode_data_def, encode_expr, encode_member,
    encode_params, encode_type,
};
pub use expr::{
    AssignStmt, BinaryExpr, BinaryOp, CallExpr, Capture, ClosureLit, Code, CoroCallExpr, Expr,
    IfStmt, Place, Stmt, UnaryExpr, UnaryOp, VarDecl, WhileStmt,
};
pub use member::{DataDef, MemberDef, MemberKind};
pub use params::{Param, ParamKind, Parameters};
pub use types::{InvokableSig, TypeSpec, TypedSpec};
