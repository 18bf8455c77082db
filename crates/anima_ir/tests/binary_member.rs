use anima_ir::*;
use anima_syntax::{Span, Symbol};

fn sample_member() -> MemberDef {
    // (who: String, times: Integer = 1) { while ... write(who) }
    let params = Parameters {
        params: vec![
            Param {
                name: Symbol::intern("who"),
                ty: Some(TypeSpec::Named(Symbol::intern("String"))),
                kind: ParamKind::Required,
            },
            Param {
                name: Symbol::intern("times"),
                ty: Some(TypeSpec::Named(Symbol::intern("Integer"))),
                kind: ParamKind::Defaulted(Expr::Int(1)),
            },
        ]
        .into_boxed_slice(),
        return_ty: None,
    };
    let body: Code = vec![
        Stmt::VarDecl(Box::new(VarDecl {
            name: Symbol::intern("i"),
            shared: false,
            ty: None,
            slot: 2,
            value: Expr::Int(0),
        })),
        Stmt::While(Box::new(WhileStmt {
            cond: Expr::Binary(Box::new(BinaryExpr {
                op: BinaryOp::Lt,
                left: Expr::Local {
                    name: Symbol::intern("i"),
                    slot: 2,
                    shared: false,
                },
                right: Expr::Local {
                    name: Symbol::intern("times"),
                    slot: 1,
                    shared: false,
                },
            })),
            body: vec![
                Stmt::Expr(Expr::Call(Box::new(CallExpr {
                    receiver: None,
                    method: Symbol::intern("write"),
                    args: vec![Expr::Local {
                        name: Symbol::intern("who"),
                        slot: 0,
                        shared: false,
                    }]
                    .into_boxed_slice(),
                    span: Span::new(40, 50),
                }))),
                Stmt::Assign(Box::new(AssignStmt {
                    target: Place::Local {
                        name: Symbol::intern("i"),
                        slot: 2,
                        shared: false,
                    },
                    value: Expr::Binary(Box::new(BinaryExpr {
                        op: BinaryOp::Add,
                        left: Expr::Local {
                            name: Symbol::intern("i"),
                            slot: 2,
                            shared: false,
                        },
                        right: Expr::Int(1),
                    })),
                })),
            ]
            .into_boxed_slice(),
        })),
    ]
    .into_boxed_slice();
    MemberDef {
        name: Symbol::intern("greet"),
        kind: MemberKind::Method,
        params,
        body,
        locals_count: 3,
    }
}

#[test]
fn member_survives_binary_form() {
    let def = sample_member();
    let mut w = ByteWriter::new();
    encode_member(&def, &mut w);
    let bytes = w.into_bytes();
    let mut r = ByteReader::new(&bytes);
    let back = decode_member(&mut r).expect("decode");
    assert!(r.is_done());
    assert_eq!(def, back);
}

#[test]
fn truncated_input_is_an_error_not_a_panic() {
    let def = sample_member();
    let mut w = ByteWriter::new();
    encode_member(&def, &mut w);
    let bytes = w.into_bytes();
    for cut in [0, 1, bytes.len() / 2, bytes.len() - 1] {
        let mut r = ByteReader::new(&bytes[..cut]);
        assert!(decode_member(&mut r).is_err());
    }
}

#[test]
fn unknown_tag_is_rejected() {
    let mut r = ByteReader::new(&[0xff]);
    assert!(matches!(decode_expr(&mut r), Err(BinError::BadTag(0xff))));
}
