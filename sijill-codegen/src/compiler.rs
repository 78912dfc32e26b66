//! # Container compiler
//!
//! Turns a live [`Container`] into the Rust source of a compiled
//! container: a newtype around `Container` that re-declares every
//! service from its recorded factory path and answers inspector queries
//! from a static [`Manifest`](sijill_container::manifest::Manifest).
//!
//! ```text
//! Container ──ContainerInspector──> ids / types / tags ──┐
//!     │                                                   ├──> source
//!     └──definitions (FactorySource)──────────────────────┘
//! ```
//!
//! Only definitions declared with `service!` or `interface!` carry the
//! source text needed here.

use std::fmt::Write as _;

use proc_macro2::Literal;
use tracing::{debug, info, instrument};

use sijill_container::container::Container;
use sijill_container::definition::ServiceDefinition;
use sijill_container::error::{Result, SijillError};
use sijill_container::inspector::{ContainerInspector, Inspector, TagMap, TypeMap};
use sijill_container::settings::{ConflictPolicy, Settings};

const HEADER: &str = "\
// This file was automatically generated and contains the compiled DI container.
// Please do not modify this file.
";

const DEFAULT_RUNTIME_PATH: &str = "::sijill";

/// Emits the source of a compiled container.
///
/// # Examples
/// ```rust,ignore
/// let source = Compiler::new("AppContainer").compile(&container)?;
/// std::fs::write(out_dir.join("container.rs"), source)?;
/// ```
#[derive(Debug, Clone)]
pub struct Compiler {
    struct_name: String,
    runtime_path: String,
}

impl Compiler {
    /// Compiler emitting a struct named `struct_name`.
    pub fn new(struct_name: impl Into<String>) -> Self {
        Self {
            struct_name: struct_name.into(),
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
        }
    }

    /// Path the emitted code uses to reach the runtime, `::sijill` by
    /// default.
    pub fn with_runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    /// Compiles `container` into Rust source.
    ///
    /// # Errors
    /// [`SijillError::CompilationFailure`] if a definition has no
    /// recorded source, a recorded fragment does not parse, or the
    /// emitted file does not parse.
    #[instrument(skip(self, container), fields(struct_name = %self.struct_name))]
    pub fn compile(&self, container: &Container) -> Result<String> {
        parse_fragment::<syn::Ident>(None, "struct name", &self.struct_name)?;
        parse_fragment::<syn::Path>(None, "runtime path", &self.runtime_path)?;

        let inspector = ContainerInspector::new(container);
        let methods = inspector.service_methods();
        let ids = inspector.service_ids()?;
        let types = inspector.typed_service_ids()?;
        let tags = inspector.tagged_service_ids()?;

        let mut definitions = Vec::with_capacity(methods.len());
        for (id, definition) in &methods {
            definitions.push(self.compile_definition(id, definition)?);
        }

        let settings = self.compile_settings(container.settings())?;
        let source = self.compile_container(&definitions, &settings, &ids, &types, &tags);
        syn::parse_file(&source).map_err(|err| {
            SijillError::compilation(None, format!("emitted source does not parse: {err}"))
        })?;

        info!(services = ids.len(), types = types.len(), tags = tags.len(), "Compiled container");
        Ok(source)
    }

    /// One `.define(...)` call re-declaring `definition`.
    fn compile_definition(&self, id: &str, definition: &ServiceDefinition) -> Result<String> {
        let source = definition.source().ok_or_else(|| {
            SijillError::compilation(
                Some(id),
                "no recorded factory source, declare it with service! or interface!",
            )
        })?;

        parse_fragment::<syn::Path>(Some(id), "factory path", source.factory)?;
        parse_fragment::<syn::Type>(Some(id), "declared type", source.declared)?;

        let rt = &self.runtime_path;
        let name = string_literal(definition.method());
        let mut call = match source.concrete {
            Some(concrete) => {
                parse_fragment::<syn::Type>(Some(id), "concrete type", concrete)?;
                format!(
                    "{rt}::interface!({name} => {}, {concrete}, {})",
                    source.declared, source.factory
                )
            }
            None => format!("{rt}::service!({name} => {}, {})", source.declared, source.factory),
        };

        if let Some(tag) = definition.tag() {
            let _ = write!(call, ".tagged({})", string_literal(tag));
        }

        debug!(service = id, "Compiled definition");
        Ok(call)
    }

    /// A `Settings` expression equal to `settings`.
    fn compile_settings(&self, settings: &Settings) -> Result<String> {
        let rt = &self.runtime_path;
        let mut expr = format!("{rt}::settings::Settings::default()");

        if settings.debug {
            expr.push_str(".debug(true)");
        }
        let policy = match settings.conflict_policy {
            ConflictPolicy::Override => None,
            ConflictPolicy::KeepFirst => Some("KeepFirst"),
            ConflictPolicy::Reject => Some("Reject"),
        };
        if let Some(policy) = policy {
            let _ = write!(expr, ".conflict_policy({rt}::settings::ConflictPolicy::{policy})");
        }
        if let Some(dir) = &settings.cache_dir {
            let dir = dir.to_str().ok_or_else(|| {
                SijillError::compilation(None, format!("cache dir {} is not valid UTF-8", dir.display()))
            })?;
            let _ = write!(expr, ".cache_dir({})", string_literal(dir));
        }
        if settings.allow_override {
            expr.push_str(".allow_override(true)");
        }

        Ok(expr)
    }

    fn compile_container(
        &self,
        definitions: &[String],
        settings: &str,
        ids: &[String],
        types: &TypeMap,
        tags: &TagMap,
    ) -> String {
        let rt = &self.runtime_path;
        let name = &self.struct_name;

        let mut out = String::with_capacity(2048);
        out.push_str(HEADER);
        out.push('\n');

        let _ = writeln!(out, "static MANIFEST: {rt}::manifest::Manifest = {rt}::manifest::Manifest {{");
        out.push_str("    service_ids: &[\n");
        for id in ids {
            let _ = writeln!(out, "        {},", string_literal(id));
        }
        out.push_str("    ],\n    typed_service_ids: &[\n");
        for (type_name, id) in types {
            let _ = writeln!(out, "        ({}, {}),", string_literal(type_name), string_literal(id));
        }
        out.push_str("    ],\n    tagged_service_ids: &[\n");
        for (tag, ids) in tags {
            let ids: Vec<String> = ids.iter().map(|id| string_literal(id)).collect();
            let _ = writeln!(out, "        ({}, &[{}]),", string_literal(tag), ids.join(", "));
        }
        out.push_str("    ],\n};\n\n");

        let _ = writeln!(out, "pub struct {name}({rt}::Container);\n");

        let _ = writeln!(out, "impl {name} {{");
        let _ = writeln!(out, "    pub fn new() -> {rt}::Result<Self> {{");
        let _ = writeln!(out, "        let container = {rt}::Container::builder()");
        out.push_str("            .manifest(&MANIFEST)\n");
        let _ = writeln!(out, "            .settings({settings})");
        for definition in definitions {
            let _ = writeln!(out, "            .define({definition})");
        }
        out.push_str("            .build()?;\n");
        out.push_str("        Ok(Self(container))\n    }\n\n");
        let _ = writeln!(out, "    pub fn manifest() -> &'static {rt}::manifest::Manifest {{");
        out.push_str("        &MANIFEST\n    }\n}\n\n");

        let _ = writeln!(out, "impl ::std::ops::Deref for {name} {{");
        let _ = writeln!(out, "    type Target = {rt}::Container;\n");
        out.push_str("    fn deref(&self) -> &Self::Target {\n        &self.0\n    }\n}\n\n");

        let _ = writeln!(out, "impl {rt}::inspector::Inspector for {name} {{");
        let _ = writeln!(
            out,
            "    fn service_ids(&self) -> {rt}::Result<::std::vec::Vec<::std::string::String>> {{"
        );
        out.push_str("        Ok(MANIFEST.service_ids())\n    }\n\n");
        let _ = writeln!(out, "    fn typed_service_ids(&self) -> {rt}::Result<{rt}::inspector::TypeMap> {{");
        out.push_str("        Ok(MANIFEST.type_map())\n    }\n\n");
        let _ = writeln!(out, "    fn tagged_service_ids(&self) -> {rt}::Result<{rt}::inspector::TagMap> {{");
        out.push_str("        Ok(MANIFEST.tag_map())\n    }\n}\n");

        out
    }
}

fn string_literal(value: &str) -> String {
    Literal::string(value).to_string()
}

fn parse_fragment<T: syn::parse::Parse>(service: Option<&str>, what: &str, text: &str) -> Result<T> {
    syn::parse_str::<T>(text).map_err(|err| {
        SijillError::compilation(service, format!("{what} `{text}` does not parse: {err}"))
    })
}
