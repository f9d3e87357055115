use std::fmt::{Debug, Display};
use std::path::PathBuf;

use thiserror::Error;

use crate::deps::arcstr::ArcStr;
use crate::layout::error::LayoutError;

pub type Result<T> = std::result::Result<T, MaskError>;

pub struct MaskError {
    pub(crate) source: ErrorSource,
    pub(crate) context: Vec<ErrorContext>,
}

impl MaskError {
    pub fn source(&self) -> &ErrorSource {
        &self.source
    }

    /// The context frames attached while the error propagated, innermost first.
    pub fn context(&self) -> &[ErrorContext] {
        &self.context
    }
}

impl std::error::Error for MaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for MaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error:\n{}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for item in self.context.iter() {
                writeln!(f, "\twhile {}", item)?;
            }
        }
        Ok(())
    }
}

impl Debug for MaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for (i, item) in self.context.iter().enumerate() {
                writeln!(f, "\t{}: {:?}", i, item)?;
            }
        }
        Ok(())
    }
}

impl<T> From<T> for MaskError
where
    T: Into<ErrorSource>,
{
    fn from(value: T) -> Self {
        Self {
            source: value.into(),
            context: Vec::new(),
        }
    }
}

impl MaskError {
    pub fn new(source: impl Into<ErrorSource>) -> Self {
        Self {
            source: source.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<ErrorContext>) -> Self {
        self.context.push(ctx.into());
        self
    }

    #[inline]
    pub fn into_inner(self) -> ErrorSource {
        self.source
    }
}

#[inline]
pub fn with_err_context<T, E, C>(result: std::result::Result<T, E>, ctx: C) -> Result<T>
where
    C: FnOnce() -> ErrorContext,
    E: Into<MaskError>,
{
    result.map_err(|err| err.into().with_context(ctx()))
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorContext {
    BuildBlock { name: ArcStr, kind: &'static str },
    PlaceBlock { name: ArcStr, at: [f64; 2] },
    CreateDir(PathBuf),
    CreateFile(PathBuf),
    ReadFile(PathBuf),
    Task(ArcStr),
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorContext::*;
        match self {
            BuildBlock { name, kind } => write!(f, "building {kind} block {name}"),
            PlaceBlock { name, at } => {
                write!(f, "placing block {name} at ({}, {})", at[0], at[1])
            }
            CreateDir(path) => write!(f, "creating directory {path:?}"),
            CreateFile(path) => write!(f, "creating file {path:?}"),
            ReadFile(path) => write!(f, "reading file {path:?}"),
            Task(task) => write!(f, "{task}"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorSource {
    #[error("infeasible device dimensions: {0}")]
    Dimension(String),

    #[error("pad too small: a {size} um pad leaves less than the {min_feature} um minimum feature")]
    PadTooSmall { size: f64, min_feature: f64 },

    #[error("unknown routing mode `{0}`; expected `-|` or `|-`")]
    InvalidRoutingMode(String),

    #[error("no such layer: {0}")]
    LayerNotFound(String),

    #[error("distinct cells share the name {0}")]
    NameCollision(ArcStr),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("error while exporting layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error parsing TOML: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("error parsing CSV: {0}")]
    CsvParsing(#[from] csv::Error),

    #[error("error parsing JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("unexpected error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
