//! Import closure and type resolution.
//!
//! Turns the per-file ASTs into one fully materialized [`Schema`]: imports
//! are read relative to the root search path, every type is registered by
//! fully-qualified name, field type references are resolved
//! innermost-scope-outward, and default literals are converted against the
//! resolved field type. Any diagnostic fails the whole load; the comparison
//! core never sees a partially loaded schema.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{LoadDiagnostic, ProtoDiffError, Result};
use crate::loader::parser::{
    parse_file, EnumAst, FieldAst, FileAst, LiteralAst, MessageAst, MethodAst, ServiceAst, Syntax,
};
use crate::model::{
    DefaultValue, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, FieldType,
    MessageDescriptor, MethodDescriptor, Schema, ServiceDescriptor, ValueKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeKind {
    Message,
    Enum,
}

struct ParsedFile {
    label: String,
    ast: FileAst,
    is_entry: bool,
}

/// An import waiting to be read, with the statement that requested it so a
/// failure is diagnosed in the importing file.
struct PendingImport {
    path: String,
    imported_from: String,
    line: u32,
    column: u32,
}

fn pending_imports(ast: &FileAst, from: &str) -> Vec<PendingImport> {
    ast.imports
        .iter()
        .map(|import| PendingImport {
            path: import.path.clone(),
            imported_from: from.to_string(),
            line: import.line,
            column: import.column,
        })
        .collect()
}

/// Load the schema rooted at `entry`, resolving imports relative to `root`.
pub fn load_schema(entry: &Path, root: &Path) -> Result<Schema> {
    let entry_label = entry.display().to_string();
    let mut diagnostics = Vec::new();
    let mut files = Vec::new();
    let mut pending: Vec<PendingImport> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let source = fs::read_to_string(entry).map_err(|e| ProtoDiffError::io(entry, e))?;
    let (ast, mut parse_diags) = parse_file(&entry_label, &source);
    diagnostics.append(&mut parse_diags);
    pending.extend(pending_imports(&ast, &entry_label));
    files.push(ParsedFile {
        label: entry_label.clone(),
        ast,
        is_entry: true,
    });

    while let Some(import) = pending.pop() {
        if !seen.insert(import.path.clone()) {
            continue;
        }
        let path = root.join(&import.path);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                diagnostics.push(LoadDiagnostic::new(
                    &import.imported_from,
                    import.line,
                    import.column,
                    format!("cannot read import '{}': {err}", import.path),
                ));
                continue;
            }
        };
        let (ast, mut parse_diags) = parse_file(&import.path, &source);
        diagnostics.append(&mut parse_diags);
        pending.extend(pending_imports(&ast, &import.path));
        files.push(ParsedFile {
            label: import.path,
            ast,
            is_entry: false,
        });
    }

    let mut resolver = Resolver {
        kinds: IndexMap::new(),
        schema: Schema::new(&entry_label, files[0].ast.package.clone()),
        diagnostics,
    };
    resolver.collect_types(&files);
    resolver.build(&files);

    debug!(
        entry = %entry_label,
        files = files.len(),
        diagnostics = resolver.diagnostics.len(),
        "schema load finished"
    );
    if resolver.diagnostics.is_empty() {
        Ok(resolver.schema)
    } else {
        Err(ProtoDiffError::load(entry_label, resolver.diagnostics))
    }
}

struct Resolver {
    /// Every declared type's fully-qualified name and whether it is a
    /// message or an enum. Populated before any field is resolved.
    kinds: IndexMap<String, TypeKind>,
    schema: Schema,
    diagnostics: Vec<LoadDiagnostic>,
}

impl Resolver {
    fn collect_types(&mut self, files: &[ParsedFile]) {
        for file in files {
            let prefix = file.ast.package.clone().unwrap_or_default();
            for message in &file.ast.messages {
                self.collect_message(&file.label, message, &prefix);
            }
            for enum_ast in &file.ast.enums {
                self.collect_enum(&file.label, enum_ast, &prefix);
            }
        }
    }

    fn collect_message(&mut self, file: &str, ast: &MessageAst, prefix: &str) {
        let full = join_name(prefix, &ast.name);
        if self.kinds.insert(full.clone(), TypeKind::Message).is_some() {
            self.diagnostics.push(LoadDiagnostic::new(
                file,
                ast.line,
                ast.column,
                format!("type '{full}' is declared more than once"),
            ));
        }
        for nested in &ast.messages {
            self.collect_message(file, nested, &full);
        }
        for nested in &ast.enums {
            self.collect_enum(file, nested, &full);
        }
    }

    fn collect_enum(&mut self, file: &str, ast: &EnumAst, prefix: &str) {
        let full = join_name(prefix, &ast.name);
        if self.kinds.insert(full.clone(), TypeKind::Enum).is_some() {
            self.diagnostics.push(LoadDiagnostic::new(
                file,
                ast.line,
                ast.column,
                format!("type '{full}' is declared more than once"),
            ));
        }
    }

    fn build(&mut self, files: &[ParsedFile]) {
        for file in files {
            let package = file.ast.package.clone().unwrap_or_default();
            // Resolution scopes, outermost first: fully-qualified fallback,
            // then the package, then each enclosing message on descent.
            let scopes = vec![String::new(), package.clone()];

            for message in &file.ast.messages {
                self.build_message(file, message, &package, &scopes, file.is_entry);
            }
            for enum_ast in &file.ast.enums {
                self.build_enum(enum_ast, &package, file.is_entry);
            }
            if file.is_entry {
                for service in &file.ast.services {
                    self.build_service(file, service, &package, &scopes);
                }
            }
        }
    }

    fn build_message(
        &mut self,
        file: &ParsedFile,
        ast: &MessageAst,
        prefix: &str,
        scopes: &[String],
        top_level: bool,
    ) {
        let full = join_name(prefix, &ast.name);
        let mut scopes = scopes.to_vec();
        scopes.push(full.clone());

        let fields = ast
            .fields
            .iter()
            .map(|field| self.build_field(file, field, &full, &scopes))
            .collect();
        let descriptor = MessageDescriptor {
            name: ast.name.clone(),
            full_name: full.clone(),
            fields,
        };
        // Duplicates were already diagnosed in the collection pass.
        self.schema.add_message(descriptor, top_level);

        for nested in &ast.messages {
            self.build_message(file, nested, &full, &scopes, false);
        }
        for nested in &ast.enums {
            self.build_enum(nested, &full, false);
        }
    }

    fn build_field(
        &mut self,
        file: &ParsedFile,
        ast: &FieldAst,
        message_full: &str,
        scopes: &[String],
    ) -> FieldDescriptor {
        let (field_type, type_name) = if let Some(scalar) = FieldType::from_keyword(&ast.type_ref) {
            (scalar, None)
        } else {
            match self.resolve_type(&ast.type_ref, scopes) {
                Some((full, TypeKind::Message)) => (FieldType::Message, Some(full)),
                Some((full, TypeKind::Enum)) => (FieldType::Enum, Some(full)),
                None => {
                    self.diagnostics.push(LoadDiagnostic::new(
                        &file.label,
                        ast.line,
                        ast.column,
                        format!("unresolved type '{}'", ast.type_ref),
                    ));
                    (FieldType::Message, None)
                }
            }
        };

        let default = match &ast.default {
            Some(_) if file.ast.syntax == Syntax::Proto3 => {
                self.diagnostics.push(LoadDiagnostic::new(
                    &file.label,
                    ast.line,
                    ast.column,
                    "proto3 fields cannot declare default values",
                ));
                None
            }
            Some(literal) => self.convert_default(&file.label, ast, field_type, literal),
            None => None,
        };

        FieldDescriptor {
            name: ast.name.clone(),
            full_name: format!("{message_full}.{}", ast.name),
            number: ast.number,
            label: ast.label,
            explicit_presence: ast.explicit_presence,
            field_type,
            type_name,
            default,
        }
    }

    fn convert_default(
        &mut self,
        file: &str,
        ast: &FieldAst,
        field_type: FieldType,
        literal: &LiteralAst,
    ) -> Option<DefaultValue> {
        let converted = match (field_type.value_kind(), literal) {
            (ValueKind::I32 | ValueKind::I64, LiteralAst::Int(v)) => Some(DefaultValue::Int(*v)),
            (ValueKind::U32 | ValueKind::U64, LiteralAst::Int(v)) if *v >= 0 => {
                Some(DefaultValue::Uint(v.unsigned_abs()))
            }
            (ValueKind::U32 | ValueKind::U64, LiteralAst::Uint(v)) => Some(DefaultValue::Uint(*v)),
            (ValueKind::F32 | ValueKind::F64, LiteralAst::Float(v)) => Some(DefaultValue::Float(*v)),
            (ValueKind::F32 | ValueKind::F64, LiteralAst::Int(v)) => {
                Some(DefaultValue::Float(*v as f64))
            }
            (ValueKind::F32 | ValueKind::F64, LiteralAst::Ident(name)) => match name.as_str() {
                "inf" => Some(DefaultValue::Float(f64::INFINITY)),
                "nan" => Some(DefaultValue::Float(f64::NAN)),
                _ => None,
            },
            (ValueKind::Bool, LiteralAst::Ident(name)) => match name.as_str() {
                "true" => Some(DefaultValue::Bool(true)),
                "false" => Some(DefaultValue::Bool(false)),
                _ => None,
            },
            (ValueKind::String | ValueKind::Bytes, LiteralAst::Str(s)) => {
                Some(DefaultValue::String(s.clone()))
            }
            (ValueKind::Enum, LiteralAst::Ident(name)) => Some(DefaultValue::Enum(name.clone())),
            _ => None,
        };
        if converted.is_none() {
            self.diagnostics.push(LoadDiagnostic::new(
                file,
                ast.line,
                ast.column,
                format!(
                    "default value does not match field type '{}'",
                    field_type.proto_name()
                ),
            ));
        }
        converted
    }

    fn build_enum(&mut self, ast: &EnumAst, prefix: &str, top_level: bool) {
        let full = join_name(prefix, &ast.name);
        let descriptor = EnumDescriptor {
            name: ast.name.clone(),
            full_name: full,
            values: ast
                .values
                .iter()
                .map(|v| EnumValueDescriptor {
                    name: v.name.clone(),
                    number: v.number,
                })
                .collect(),
        };
        self.schema.add_enum(descriptor, top_level);
    }

    fn build_service(
        &mut self,
        file: &ParsedFile,
        ast: &ServiceAst,
        package: &str,
        scopes: &[String],
    ) {
        let methods = ast
            .methods
            .iter()
            .map(|method| {
                let input_type = self.resolve_method_type(file, method, &method.input_type, scopes);
                let output_type =
                    self.resolve_method_type(file, method, &method.output_type, scopes);
                MethodDescriptor {
                    name: method.name.clone(),
                    input_type,
                    output_type,
                    client_streaming: method.client_streaming,
                    server_streaming: method.server_streaming,
                }
            })
            .collect();
        self.schema.add_service(ServiceDescriptor {
            name: ast.name.clone(),
            full_name: join_name(package, &ast.name),
            methods,
        });
    }

    /// Resolve an rpc request/response type to a message's full name. The
    /// unresolved reference is kept on error so later diagnostics stay
    /// readable.
    fn resolve_method_type(
        &mut self,
        file: &ParsedFile,
        method: &MethodAst,
        reference: &str,
        scopes: &[String],
    ) -> String {
        match self.resolve_type(reference, scopes) {
            Some((full, TypeKind::Message)) => full,
            Some((_, TypeKind::Enum)) => {
                self.diagnostics.push(LoadDiagnostic::new(
                    &file.label,
                    method.line,
                    method.column,
                    format!("'{reference}' is an enum, rpc types must be messages"),
                ));
                reference.to_string()
            }
            None => {
                self.diagnostics.push(LoadDiagnostic::new(
                    &file.label,
                    method.line,
                    method.column,
                    format!("unresolved type '{reference}'"),
                ));
                reference.to_string()
            }
        }
    }

    /// Innermost-scope-outward lookup. A leading `.` forces an exact
    /// fully-qualified match.
    fn resolve_type(&self, reference: &str, scopes: &[String]) -> Option<(String, TypeKind)> {
        if let Some(stripped) = reference.strip_prefix('.') {
            return self
                .kinds
                .get(stripped)
                .map(|kind| (stripped.to_string(), *kind));
        }
        for scope in scopes.iter().rev() {
            let candidate = join_name(scope, reference);
            if let Some(kind) = self.kinds.get(&candidate) {
                return Some((candidate, *kind));
            }
        }
        None
    }
}

fn join_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn load(dir: &TempDir, entry: &str) -> Result<Schema> {
        load_schema(&dir.path().join(entry), dir.path())
    }

    #[test]
    fn test_load_single_file() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "api.proto",
            r#"syntax = "proto3";
               package acme.v1;
               message User {
                 int32 id = 1;
                 string name = 2;
               }
               enum Status { OK = 0; }
               service Api {
                 rpc Get (User) returns (User);
               }"#,
        );
        let schema = load(&dir, "api.proto").unwrap();
        assert_eq!(schema.package.as_deref(), Some("acme.v1"));
        assert!(schema.message("acme.v1.User").is_some());
        assert!(schema.enum_type("acme.v1.Status").is_some());
        let service = schema.find_service("Api").unwrap();
        assert_eq!(service.methods[0].input_type, "acme.v1.User");
    }

    #[test]
    fn test_imported_types_resolve_but_stay_out_of_inventory() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "common.proto",
            r#"syntax = "proto3";
               package acme.common;
               message Money { int64 units = 1; }"#,
        );
        write_file(
            &dir,
            "api.proto",
            r#"syntax = "proto3";
               package acme.v1;
               import "common.proto";
               message Order { acme.common.Money total = 1; }"#,
        );
        let schema = load(&dir, "api.proto").unwrap();
        let order = schema.message("acme.v1.Order").unwrap();
        assert_eq!(
            order.fields[0].type_name.as_deref(),
            Some("acme.common.Money")
        );
        // Imported types are resolvable but not part of the entry inventory.
        assert!(schema.message("acme.common.Money").is_some());
        let top: Vec<&str> = schema.top_level_messages().map(|m| m.name.as_str()).collect();
        assert_eq!(top, vec!["Order"]);
    }

    #[test]
    fn test_nested_scope_resolution_prefers_innermost() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "api.proto",
            r#"syntax = "proto3";
               package pkg;
               message Kind { int32 outer = 1; }
               message Holder {
                 message Kind { int32 inner = 1; }
                 Kind kind = 1;
                 .pkg.Kind forced = 2;
               }"#,
        );
        let schema = load(&dir, "api.proto").unwrap();
        let holder = schema.message("pkg.Holder").unwrap();
        assert_eq!(holder.fields[0].type_name.as_deref(), Some("pkg.Holder.Kind"));
        assert_eq!(holder.fields[1].type_name.as_deref(), Some("pkg.Kind"));
    }

    #[test]
    fn test_proto2_defaults_are_typed() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "api.proto",
            r#"syntax = "proto2";
               package pkg;
               enum Mode { SLOW = 0; FAST = 1; }
               message Config {
                 optional int32 retries = 1 [default = 3];
                 optional Mode mode = 2 [default = FAST];
                 optional bool verbose = 3 [default = true];
               }"#,
        );
        let schema = load(&dir, "api.proto").unwrap();
        let config = schema.message("pkg.Config").unwrap();
        assert_eq!(config.fields[0].default, Some(DefaultValue::Int(3)));
        assert_eq!(
            config.fields[1].default,
            Some(DefaultValue::Enum("FAST".to_string()))
        );
        assert_eq!(config.fields[2].default, Some(DefaultValue::Bool(true)));
    }

    #[test]
    fn test_proto3_default_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "api.proto",
            r#"syntax = "proto3";
               message M { int32 x = 1 [default = 3]; }"#,
        );
        let err = load(&dir, "api.proto").unwrap_err();
        assert!(err
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("proto3")));
    }

    #[test]
    fn test_unresolved_type_fails_the_load() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "api.proto",
            r#"syntax = "proto3";
               message M { Missing x = 1; }"#,
        );
        let err = load(&dir, "api.proto").unwrap_err();
        let diags = err.diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("Missing"));
        assert_eq!(diags[0].line, 2);
    }

    #[test]
    fn test_missing_import_fails_the_load() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "api.proto",
            r#"syntax = "proto3";
               import "nope.proto";"#,
        );
        let err = load(&dir, "api.proto").unwrap_err();
        let diag = err
            .diagnostics()
            .iter()
            .find(|d| d.message.contains("nope.proto"))
            .unwrap();
        // Diagnosed at the import statement, not at the top of the entry.
        assert!(diag.file.ends_with("api.proto"));
        assert_eq!((diag.line, diag.column), (2, 16));
    }

    #[test]
    fn test_missing_import_names_the_importing_file() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "a.proto",
            "syntax = \"proto3\";\nimport \"b.proto\";\nmessage A {}",
        );
        write_file(
            &dir,
            "b.proto",
            "syntax = \"proto3\";\nimport \"nope.proto\";\nmessage B {}",
        );
        let err = load(&dir, "a.proto").unwrap_err();
        let diag = err
            .diagnostics()
            .iter()
            .find(|d| d.message.contains("nope.proto"))
            .unwrap();
        assert_eq!(diag.file, "b.proto");
        assert_eq!((diag.line, diag.column), (2, 1));
    }

    #[test]
    fn test_import_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "a.proto",
            r#"syntax = "proto3"; import "b.proto"; message A { B b = 1; }"#,
        );
        write_file(
            &dir,
            "b.proto",
            r#"syntax = "proto3"; import "a.proto"; message B { int32 x = 1; }"#,
        );
        let schema = load(&dir, "a.proto").unwrap();
        assert_eq!(
            schema.message("A").unwrap().fields[0].type_name.as_deref(),
            Some("B")
        );
    }

    #[test]
    fn test_duplicate_type_is_diagnosed() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "api.proto",
            r#"syntax = "proto3";
               message M { int32 a = 1; }
               message M { int32 b = 1; }"#,
        );
        let err = load(&dir, "api.proto").unwrap_err();
        assert!(err
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("more than once")));
    }

    #[test]
    fn test_entry_file_without_package() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "api.proto", r#"syntax = "proto3"; message M {}"#);
        let schema = load(&dir, "api.proto").unwrap();
        assert!(schema.package.is_none());
        assert!(schema.message("M").is_some());
    }
}
