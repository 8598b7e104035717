//! Recursive-descent parser for a practical proto2/proto3 subset.
//!
//! Parses one file into an AST with unresolved type references; the resolver
//! turns the per-file ASTs into a [`Schema`](crate::model::Schema). On a
//! grammar error the parser records a diagnostic and resynchronizes at the
//! next `;` or block close, so one broken statement does not hide the rest.
//!
//! Supported: `syntax`, `package`, `import`, `option` (ignored), `message`
//! with nested types, `oneof` (fields flattened, explicit presence), `map`
//! fields (entry message synthesized), `reserved` (ignored), `enum`,
//! `service`/`rpc` with streaming markers.

use crate::error::LoadDiagnostic;
use crate::loader::lexer::{tokenize, Token, TokenKind};
use crate::model::FieldLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Syntax {
    Proto2,
    Proto3,
}

#[derive(Debug)]
pub(crate) struct FileAst {
    pub syntax: Syntax,
    pub package: Option<String>,
    pub imports: Vec<ImportAst>,
    pub messages: Vec<MessageAst>,
    pub enums: Vec<EnumAst>,
    pub services: Vec<ServiceAst>,
}

/// One `import` statement with its position, so a failing import can be
/// diagnosed at the statement that requested it.
#[derive(Debug)]
pub(crate) struct ImportAst {
    pub path: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug)]
pub(crate) struct MessageAst {
    pub name: String,
    pub fields: Vec<FieldAst>,
    pub messages: Vec<MessageAst>,
    pub enums: Vec<EnumAst>,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug)]
pub(crate) struct FieldAst {
    pub name: String,
    pub number: u32,
    pub label: FieldLabel,
    pub explicit_presence: bool,
    /// Scalar keyword or unresolved type reference. A leading `.` forces
    /// fully-qualified resolution.
    pub type_ref: String,
    pub default: Option<LiteralAst>,
    pub line: u32,
    pub column: u32,
}

/// A `[default = …]` literal, converted to a typed
/// [`DefaultValue`](crate::model::DefaultValue) once the field type is known.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LiteralAst {
    /// `true`, `false`, an enum value name, or `inf`/`nan`.
    Ident(String),
    Int(i64),
    /// Positive integer too large for `i64`.
    Uint(u64),
    Float(f64),
    Str(String),
}

#[derive(Debug)]
pub(crate) struct EnumAst {
    pub name: String,
    pub values: Vec<EnumValueAst>,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug)]
pub(crate) struct EnumValueAst {
    pub name: String,
    pub number: i32,
}

#[derive(Debug)]
pub(crate) struct ServiceAst {
    pub name: String,
    pub methods: Vec<MethodAst>,
}

#[derive(Debug)]
pub(crate) struct MethodAst {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub line: u32,
    pub column: u32,
}

/// Parse one source file. Always returns an AST; callers treat a non-empty
/// diagnostic list as fatal for the whole load.
pub(crate) fn parse_file(file: &str, source: &str) -> (FileAst, Vec<LoadDiagnostic>) {
    let (tokens, mut diagnostics) = tokenize(file, source);
    let mut parser = Parser {
        file,
        tokens,
        pos: 0,
        diagnostics: Vec::new(),
    };
    let ast = parser.parse();
    diagnostics.append(&mut parser.diagnostics);
    (ast, diagnostics)
}

struct Parser<'a> {
    file: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<LoadDiagnostic>,
}

impl Parser<'_> {
    fn parse(&mut self) -> FileAst {
        let mut ast = FileAst {
            syntax: Syntax::Proto2,
            package: None,
            imports: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            services: Vec::new(),
        };

        while !self.at_eof() {
            match self.peek_ident() {
                Some("syntax") => {
                    self.bump();
                    self.expect_symbol('=');
                    match self.expect_string() {
                        Some(s) if s == "proto3" => ast.syntax = Syntax::Proto3,
                        Some(s) if s == "proto2" => ast.syntax = Syntax::Proto2,
                        Some(s) => self.error_here(format!("unknown syntax '{s}'")),
                        None => {}
                    }
                    self.expect_symbol(';');
                }
                Some("package") => {
                    self.bump();
                    if let Some(name) = self.qualified_name() {
                        ast.package = Some(name);
                    }
                    self.expect_symbol(';');
                }
                Some("import") => {
                    let (line, column) = self.position();
                    self.bump();
                    // `public` and `weak` imports are treated as plain ones.
                    if matches!(self.peek_ident(), Some("public" | "weak")) {
                        self.bump();
                    }
                    if let Some(path) = self.expect_string() {
                        ast.imports.push(ImportAst { path, line, column });
                    }
                    self.expect_symbol(';');
                }
                Some("option") => self.skip_option_statement(),
                Some("message") => {
                    if let Some(message) = self.parse_message() {
                        ast.messages.push(message);
                    }
                }
                Some("enum") => {
                    if let Some(enum_ast) = self.parse_enum() {
                        ast.enums.push(enum_ast);
                    }
                }
                Some("service") => {
                    if let Some(service) = self.parse_service() {
                        ast.services.push(service);
                    }
                }
                _ if self.peek_symbol(';') => {
                    self.bump();
                }
                _ => {
                    self.error_here("expected a top-level declaration");
                    // recover() stops in front of '}'; at file scope that is
                    // the stray token itself, so consume it.
                    if self.peek_symbol('}') {
                        self.bump();
                    } else {
                        self.recover();
                    }
                }
            }
        }
        ast
    }

    fn parse_message(&mut self) -> Option<MessageAst> {
        let (line, column) = self.position();
        self.bump(); // message
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;

        let mut message = MessageAst {
            name,
            fields: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            line,
            column,
        };

        loop {
            if self.peek_symbol('}') {
                self.bump();
                return Some(message);
            }
            if self.at_eof() {
                self.error_here("unterminated message body");
                return Some(message);
            }
            match self.peek_ident() {
                Some("message") => {
                    if let Some(nested) = self.parse_message() {
                        message.messages.push(nested);
                    }
                }
                Some("enum") => {
                    if let Some(nested) = self.parse_enum() {
                        message.enums.push(nested);
                    }
                }
                Some("option") => self.skip_option_statement(),
                Some("reserved") | Some("extensions") => self.skip_statement(),
                Some("oneof") => self.parse_oneof(&mut message),
                Some("map") => {
                    if let Some((field, entry)) = self.parse_map_field() {
                        message.fields.push(field);
                        message.messages.push(entry);
                    }
                }
                _ if self.peek_symbol(';') => {
                    self.bump();
                }
                // A failed field may not have consumed any token, so always
                // resynchronize before retrying the body loop.
                _ => match self.parse_field(false) {
                    Some(field) => message.fields.push(field),
                    None => self.recover(),
                },
            }
        }
    }

    /// Parse one field declaration. Inside a oneof, labels are forbidden and
    /// every field carries explicit presence.
    fn parse_field(&mut self, in_oneof: bool) -> Option<FieldAst> {
        let (line, column) = self.position();

        let mut label = FieldLabel::Optional;
        let mut explicit_presence = in_oneof;
        if !in_oneof {
            match self.peek_ident() {
                Some("optional") => {
                    self.bump();
                    explicit_presence = true;
                }
                Some("required") => {
                    self.bump();
                    label = FieldLabel::Required;
                }
                Some("repeated") => {
                    self.bump();
                    label = FieldLabel::Repeated;
                }
                _ => {}
            }
        }

        let type_ref = self.type_reference()?;
        let name = self.expect_ident()?;
        self.expect_symbol('=')?;
        let number = self.expect_u32()?;
        let default = self.parse_field_options();
        self.expect_symbol(';')?;

        Some(FieldAst {
            name,
            number,
            label,
            explicit_presence,
            type_ref,
            default,
            line,
            column,
        })
    }

    /// `[default = X, deprecated = true, …]`. Everything but `default` is
    /// skipped. Returns the default literal if one was declared.
    fn parse_field_options(&mut self) -> Option<LiteralAst> {
        if !self.peek_symbol('[') {
            return None;
        }
        self.bump();
        let mut default = None;
        loop {
            let is_default = self.peek_ident() == Some("default");
            self.skip_option_name();
            self.expect_symbol('=');
            let value = self.parse_literal();
            if is_default {
                default = value;
            }
            if self.peek_symbol(',') {
                self.bump();
                continue;
            }
            self.expect_symbol(']');
            return default;
        }
    }

    fn parse_literal(&mut self) -> Option<LiteralAst> {
        let negative = if self.peek_symbol('-') {
            self.bump();
            true
        } else {
            false
        };
        let token = self.bump()?;
        match token.kind {
            TokenKind::Int(value) => {
                let literal = if negative {
                    if let Ok(v) = i64::try_from(value) {
                        Some(LiteralAst::Int(-v))
                    } else if value == i64::MIN.unsigned_abs() {
                        Some(LiteralAst::Int(i64::MIN))
                    } else {
                        None
                    }
                } else if let Ok(v) = i64::try_from(value) {
                    Some(LiteralAst::Int(v))
                } else {
                    Some(LiteralAst::Uint(value))
                };
                if literal.is_none() {
                    self.error_at(&token, "integer literal out of range");
                }
                literal
            }
            TokenKind::Float(value) => Some(LiteralAst::Float(if negative { -value } else { value })),
            TokenKind::Str(value) => Some(LiteralAst::Str(value)),
            TokenKind::Ident(value) => Some(LiteralAst::Ident(value)),
            _ => {
                self.error_at(&token, "expected an option value");
                None
            }
        }
    }

    fn parse_oneof(&mut self, message: &mut MessageAst) {
        self.bump(); // oneof
        let _ = self.expect_ident();
        if self.expect_symbol('{').is_none() {
            return;
        }
        loop {
            if self.peek_symbol('}') {
                self.bump();
                return;
            }
            if self.at_eof() {
                self.error_here("unterminated oneof body");
                return;
            }
            if self.peek_ident() == Some("option") {
                self.skip_option_statement();
                continue;
            }
            match self.parse_field(true) {
                Some(field) => message.fields.push(field),
                None => self.recover(),
            }
        }
    }

    /// `map<K, V> name = N;` desugars the way protoc does: a synthesized
    /// `<Name>Entry` nested message with `key = 1` and `value = 2`, and the
    /// map field itself becomes a repeated field of that entry type.
    fn parse_map_field(&mut self) -> Option<(FieldAst, MessageAst)> {
        let (line, column) = self.position();
        self.bump(); // map
        self.expect_symbol('<')?;
        let key_type = self.type_reference()?;
        self.expect_symbol(',')?;
        let value_type = self.type_reference()?;
        self.expect_symbol('>')?;
        let name = self.expect_ident()?;
        self.expect_symbol('=')?;
        let number = self.expect_u32()?;
        let _ = self.parse_field_options();
        self.expect_symbol(';')?;

        let entry_name = map_entry_name(&name);
        let entry = MessageAst {
            name: entry_name.clone(),
            line,
            column,
            fields: vec![
                FieldAst {
                    name: "key".to_string(),
                    number: 1,
                    label: FieldLabel::Optional,
                    explicit_presence: false,
                    type_ref: key_type,
                    default: None,
                    line,
                    column,
                },
                FieldAst {
                    name: "value".to_string(),
                    number: 2,
                    label: FieldLabel::Optional,
                    explicit_presence: false,
                    type_ref: value_type,
                    default: None,
                    line,
                    column,
                },
            ],
            messages: Vec::new(),
            enums: Vec::new(),
        };
        let field = FieldAst {
            name,
            number,
            label: FieldLabel::Repeated,
            explicit_presence: false,
            type_ref: entry_name,
            default: None,
            line,
            column,
        };
        Some((field, entry))
    }

    fn parse_enum(&mut self) -> Option<EnumAst> {
        let (line, column) = self.position();
        self.bump(); // enum
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;

        let mut values = Vec::new();
        loop {
            if self.peek_symbol('}') {
                self.bump();
                return Some(EnumAst { name, values, line, column });
            }
            if self.at_eof() {
                self.error_here("unterminated enum body");
                return Some(EnumAst { name, values, line, column });
            }
            match self.peek_ident() {
                Some("option") => self.skip_option_statement(),
                Some("reserved") => self.skip_statement(),
                _ if self.peek_symbol(';') => {
                    self.bump();
                }
                _ => {
                    let Some(value_name) = self.expect_ident() else {
                        self.recover();
                        continue;
                    };
                    if self.expect_symbol('=').is_none() {
                        self.recover();
                        continue;
                    }
                    let negative = if self.peek_symbol('-') {
                        self.bump();
                        true
                    } else {
                        false
                    };
                    let Some(number) = self.expect_i32(negative) else {
                        self.recover();
                        continue;
                    };
                    let _ = self.parse_field_options();
                    self.expect_symbol(';');
                    values.push(EnumValueAst {
                        name: value_name,
                        number,
                    });
                }
            }
        }
    }

    fn parse_service(&mut self) -> Option<ServiceAst> {
        self.bump(); // service
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;

        let mut methods = Vec::new();
        loop {
            if self.peek_symbol('}') {
                self.bump();
                return Some(ServiceAst { name, methods });
            }
            if self.at_eof() {
                self.error_here("unterminated service body");
                return Some(ServiceAst { name, methods });
            }
            match self.peek_ident() {
                Some("option") => self.skip_option_statement(),
                Some("rpc") => {
                    if let Some(method) = self.parse_rpc() {
                        methods.push(method);
                    }
                }
                _ if self.peek_symbol(';') => {
                    self.bump();
                }
                _ => {
                    self.error_here("expected 'rpc' or 'option' in service body");
                    self.recover();
                }
            }
        }
    }

    fn parse_rpc(&mut self) -> Option<MethodAst> {
        let (line, column) = self.position();
        self.bump(); // rpc
        let name = self.expect_ident()?;
        self.expect_symbol('(')?;
        let client_streaming = self.eat_keyword("stream");
        let input_type = self.qualified_name()?;
        self.expect_symbol(')')?;
        if self.peek_ident() == Some("returns") {
            self.bump();
        } else {
            self.error_here("expected 'returns'");
        }
        self.expect_symbol('(')?;
        let server_streaming = self.eat_keyword("stream");
        let output_type = self.qualified_name()?;
        self.expect_symbol(')')?;

        // Either a terminating `;` or an options block we do not interpret.
        if self.peek_symbol('{') {
            self.skip_balanced_braces();
        } else {
            self.expect_symbol(';');
        }

        Some(MethodAst {
            name,
            input_type,
            output_type,
            client_streaming,
            server_streaming,
            line,
            column,
        })
    }

    /// A field type: scalar keyword or (possibly dotted, possibly
    /// `.`-rooted) type reference.
    fn type_reference(&mut self) -> Option<String> {
        self.qualified_name()
    }

    fn qualified_name(&mut self) -> Option<String> {
        let mut name = String::new();
        if self.peek_symbol('.') {
            self.bump();
            name.push('.');
        }
        name.push_str(&self.expect_ident()?);
        while self.peek_symbol('.') {
            self.bump();
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Some(name)
    }

    /// `option …;` possibly with a parenthesized custom option name and an
    /// aggregate `{ … }` value.
    fn skip_option_statement(&mut self) {
        self.bump(); // option
        self.skip_option_name();
        self.expect_symbol('=');
        if self.peek_symbol('{') {
            self.skip_balanced_braces();
        } else {
            let _ = self.parse_literal();
        }
        self.expect_symbol(';');
    }

    fn skip_option_name(&mut self) {
        if self.peek_symbol('(') {
            self.bump();
            while !self.peek_symbol(')') && !self.at_eof() {
                self.bump();
            }
            self.bump();
        } else {
            self.bump();
        }
        while self.peek_symbol('.') {
            self.bump();
            self.bump();
        }
    }

    /// Skip the rest of the current statement through its `;`.
    fn skip_statement(&mut self) {
        while !self.at_eof() {
            if let Some(token) = self.bump() {
                if token.kind == TokenKind::Symbol(';') {
                    return;
                }
            }
        }
    }

    fn skip_balanced_braces(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.bump() {
            match token.kind {
                TokenKind::Symbol('{') => depth += 1,
                TokenKind::Symbol('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Resynchronize after an error: skip through the next `;`, or stop
    /// before a `}` so the enclosing block can close normally.
    fn recover(&mut self) {
        while !self.at_eof() {
            if self.peek_symbol('}') {
                return;
            }
            if let Some(token) = self.bump() {
                if token.kind == TokenKind::Symbol(';') {
                    return;
                }
            }
        }
    }

    // Token helpers

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_ident(&self) -> Option<&str> {
        match &self.peek().kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    fn peek_symbol(&self, symbol: char) -> bool {
        self.peek().kind == TokenKind::Symbol(symbol)
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn position(&self) -> (u32, u32) {
        let token = self.peek();
        (token.line, token.column)
    }

    fn bump(&mut self) -> Option<Token> {
        if self.at_eof() {
            return None;
        }
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        Some(token)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_ident() == Some(keyword) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Option<String> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.bump();
                Some(name)
            }
            _ => {
                self.error_here("expected an identifier");
                None
            }
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Option<()> {
        if self.peek_symbol(symbol) {
            self.bump();
            Some(())
        } else {
            self.error_here(format!("expected '{symbol}'"));
            None
        }
    }

    fn expect_string(&mut self) -> Option<String> {
        match self.peek().kind.clone() {
            TokenKind::Str(value) => {
                self.bump();
                Some(value)
            }
            _ => {
                self.error_here("expected a string literal");
                None
            }
        }
    }

    fn expect_u32(&mut self) -> Option<u32> {
        match self.peek().kind {
            TokenKind::Int(value) => {
                self.bump();
                match u32::try_from(value) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        self.error_here("field number out of range");
                        None
                    }
                }
            }
            _ => {
                self.error_here("expected a field number");
                None
            }
        }
    }

    fn expect_i32(&mut self, negative: bool) -> Option<i32> {
        match self.peek().kind {
            TokenKind::Int(value) => {
                self.bump();
                let signed = i64::try_from(value).ok().map(|v| if negative { -v } else { v });
                match signed.and_then(|v| i32::try_from(v).ok()) {
                    Some(v) => Some(v),
                    None => {
                        self.error_here("enum value number out of range");
                        None
                    }
                }
            }
            _ => {
                self.error_here("expected an enum value number");
                None
            }
        }
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let (line, column) = self.position();
        self.diagnostics
            .push(LoadDiagnostic::new(self.file, line, column, message));
    }

    fn error_at(&mut self, token: &Token, message: impl Into<String>) {
        self.diagnostics
            .push(LoadDiagnostic::new(self.file, token.line, token.column, message));
    }
}

/// protoc's synthesized map entry name: snake_case field name to CamelCase
/// plus an `Entry` suffix (`user_projects` -> `UserProjectsEntry`).
fn map_entry_name(field_name: &str) -> String {
    let mut name = String::new();
    for part in field_name.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name.push_str("Entry");
    name
}
