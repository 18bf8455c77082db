pub enum DiagnosticKind {
    // Lexer
    UnterminatedString,
    UnterminatedSymbol,
    UnterminatedBlockComment,
    UnmatchedDelimiter(char),
    UnexpectedChar(char),
    UnclosedDelimiter(char),
    BadNumberLiteral(String),
    BadEscape(char),

    // Parser
    ExpectedToken(String),
    ExpectedExpression,
    ExpectedTypeSpec,
    InvalidAssignmentTarget,
    KeywordAsIdentifier(String),
    VariadicNotLast,
    DefaultAfterVariadic,
    DuplicateParameter(String),
    CoroutineNameUnderscore(String),
    MethodNameUnderscore(String),
    BadObjectIdLiteral,

    // Binder
    UndefinedIdentifier(String),
    DuplicateLocal(String),
    CoroutineCallPlacement,
    CoroutineCallInMethod,
    WaitOutsideCoroutine,
    BranchOutsideCoroutine,
    SharedNotLocal(String),
    TypeMismatch {
        expected: String,
        actual: String,
    },
    ArgumentCountMismatch {
        name: String,
        expected_min: usize,
        expected_max: usize,
        actual: usize,
    },
    UnknownType(String),
    ReturnTypeMismatch {
        expected: String,
        actual: String,
    },

    // Custom
    Raw(String),
}

pub struct DiagnosticsFormatter;

impl DiagnosticsFormatter {
    pub fn format(kind: &DiagnosticKind) -> String {
        match kind {
            DiagnosticKind::UnterminatedString => "Unterminated string literal".into(),
            DiagnosticKind::UnterminatedSymbol => "Unterminated symbol literal".into(),
            DiagnosticKind::UnterminatedBlockComment => "Unterminated block comment".into(),
            DiagnosticKind::UnmatchedDelimiter(c) => format!("Unmatched '{}'", c),
            DiagnosticKind::UnexpectedChar(c) => format!("Unexpected character '{}'", c),
            DiagnosticKind::UnclosedDelimiter(c) => format!("Unclosed '{}'", c),
            DiagnosticKind::BadNumberLiteral(s) => format!("Malformed number literal: {}", s),
            DiagnosticKind::BadEscape(c) => format!("Unknown escape '\\{}'", c),
            DiagnosticKind::ExpectedToken(t) => format!("Expected {}", t),
            DiagnosticKind::ExpectedExpression => "Expected expression".into(),
            DiagnosticKind::ExpectedTypeSpec => "Expected type".into(),
            DiagnosticKind::InvalidAssignmentTarget => "Invalid assignment target".into(),
            DiagnosticKind::KeywordAsIdentifier(kw) => {
                format!("Keyword cannot be used as identifier: {}", kw)
            }
            DiagnosticKind::VariadicNotLast => {
                "A variadic group must be the last parameter".into()
            }
            DiagnosticKind::DefaultAfterVariadic => {
                "Defaulted parameters cannot follow a variadic group".into()
            }
            DiagnosticKind::DuplicateParameter(n) => format!("Duplicate parameter: {}", n),
            DiagnosticKind::CoroutineNameUnderscore(n) => {
                format!("Coroutine names start with '_': {}", n)
            }
            DiagnosticKind::MethodNameUnderscore(n) => {
                format!("Method names may not start with '_': {}", n)
            }
            DiagnosticKind::BadObjectIdLiteral => {
                "Object-id literal needs a name: @name or @'name'".into()
            }
            DiagnosticKind::UndefinedIdentifier(n) => format!("Undefined identifier: {}", n),
            DiagnosticKind::DuplicateLocal(n) => format!("Duplicate local: {}", n),
            DiagnosticKind::CoroutineCallPlacement => {
                "A coroutine call may only stand alone or as the source of an assignment".into()
            }
            DiagnosticKind::CoroutineCallInMethod => {
                "Coroutines cannot be called from a method body; use a coroutine or branch".into()
            }
            DiagnosticKind::WaitOutsideCoroutine => {
                "Wait points are only allowed inside coroutine bodies".into()
            }
            DiagnosticKind::BranchOutsideCoroutine => {
                "branch is only allowed inside coroutine bodies".into()
            }
            DiagnosticKind::SharedNotLocal(n) => {
                format!("'shared' only applies to locals: {}", n)
            }
            DiagnosticKind::TypeMismatch { expected, actual } => {
                format!("Type mismatch: expected {}, got {}", expected, actual)
            }
            DiagnosticKind::ArgumentCountMismatch {
                name,
                expected_min,
                expected_max,
                actual,
            } => {
                if expected_min == expected_max {
                    format!(
                        "{} expects {} argument(s), got {}",
                        name, expected_min, actual
                    )
                } else {
                    format!(
                        "{} expects {}..{} argument(s), got {}",
                        name, expected_min, expected_max, actual
                    )
                }
            }
            DiagnosticKind::UnknownType(n) => format!("Unknown type: {}", n),
            DiagnosticKind::ReturnTypeMismatch { expected, actual } => {
                format!("Return type mismatch: expected {}, got {}", expected, actual)
            }
            DiagnosticKind::Raw(s) => s.clone(),
        }
    }
}
