//! Configuration for exprx.
//!
//! Every key has a value in `defaults/exprx.default.toml`, which is compiled
//! in. [`Loader`] stacks user files and single-key overrides on top and
//! deserializes the result into [`ExprConfig`]. Later layers win.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use expr_babel::io::{ParseOptions, RenderOptions, Schema, SchemaValidation};
use expr_babel::types::NamingConvention;
use expr_babel::TransformOptions;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/exprx.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct ExprConfig {
    pub naming: NamingConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamingConfig {
    pub convention: NamingConvention,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub keep_comments: bool,
}

/// Document rendering knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: String,
    pub indent: String,
    pub xml_declaration: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    pub mode: SchemaValidation,
    pub builtin_schema: bool,
}

impl From<&InputConfig> for ParseOptions {
    fn from(config: &InputConfig) -> Self {
        ParseOptions {
            keep_comments: config.keep_comments,
        }
    }
}

impl From<&OutputConfig> for RenderOptions {
    fn from(config: &OutputConfig) -> Self {
        RenderOptions {
            indent: config.indent.clone(),
            xml_declaration: config.xml_declaration,
        }
    }
}

impl From<&ExprConfig> for TransformOptions {
    fn from(config: &ExprConfig) -> Self {
        TransformOptions {
            convention: config.naming.convention,
            parse: (&config.input).into(),
            render: (&config.output).into(),
            validation: config.validation.mode,
            schema: config
                .validation
                .builtin_schema
                .then(|| std::sync::Arc::new(Schema::builtin())),
        }
    }
}

impl From<ExprConfig> for TransformOptions {
    fn from(config: ExprConfig) -> Self {
        (&config).into()
    }
}

/// Layered configuration sources, resolved by [`Loader::build`].
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let defaults = File::from_str(DEFAULT_TOML, FileFormat::Toml);
        Self {
            builder: Config::builder().add_source(defaults),
        }
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let file = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(file);
        self
    }

    /// Adds a TOML file that must exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Adds a TOML file if it exists.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    /// Sets one dotted key, e.g. `naming.convention`, above every file.
    pub fn set_override<V>(mut self, key: &str, value: V) -> Result<Self, ConfigError>
    where
        V: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<ExprConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<ExprConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.naming.convention, NamingConvention::Short);
        assert_eq!(config.output.format, "xml");
        assert_eq!(config.output.indent, "  ");
        assert!(config.input.keep_comments);
        assert_eq!(config.validation.mode, SchemaValidation::IfSchemaPresent);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("naming.convention", "assembly-qualified")
            .expect("override to apply")
            .set_override("validation.mode", "always")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.naming.convention, NamingConvention::AssemblyQualified);
        assert_eq!(config.validation.mode, SchemaValidation::Always);
    }

    #[test]
    fn rejects_unknown_convention() {
        let result = Loader::new()
            .set_override("naming.convention", "fully-qualified")
            .expect("override to apply")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn config_converts_to_transform_options() {
        let config = Loader::new()
            .set_override("output.indent", "")
            .expect("override to apply")
            .set_override("validation.builtin_schema", false)
            .expect("override to apply")
            .build()
            .expect("config to build");
        let options: TransformOptions = config.into();
        assert_eq!(options.render.indent, "");
        assert!(options.render.xml_declaration);
        assert!(options.schema.is_none());

        let options: TransformOptions = (&load_defaults().expect("defaults")).into();
        assert_eq!(options.schema.as_deref(), Some(&Schema::builtin()));
    }

    #[test]
    fn layers_user_file() {
        let dir = std::env::temp_dir().join(format!("expr-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("exprx.toml");
        std::fs::write(&path, "[naming]\nconvention = \"full\"\n").expect("write config");

        let config = Loader::new().with_file(&path).build().expect("config to build");
        assert_eq!(config.naming.convention, NamingConvention::Full);
        assert!(config.output.xml_declaration);

        let missing = Loader::new().with_optional_file(dir.join("absent.toml")).build();
        assert!(missing.is_ok());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
