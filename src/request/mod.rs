//! Evaluation requests: result kind, session key and block parameters.

use std::{collections::BTreeSet, fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::julia_string;

/// Session name used when a block does not name one.
pub const DEFAULT_SESSION: &str = "main";

/// Reserved session value requesting an isolated, non-persistent evaluation.
pub const EPHEMERAL_SESSION: &str = "none";

pub const DEFAULT_WIDTH: u32 = 600;
pub const DEFAULT_HEIGHT: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Value of the last expression.
    #[default]
    Value,
    /// Captured standard output.
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKey {
    /// `session=none`: let-scoped, bindings do not survive.
    Ephemeral,
    /// A persistent interpreter instance reused across evaluations.
    Named(String),
}

impl SessionKey {
    /// Resolve the raw `session` parameter. Absent means `default`.
    pub fn resolve(raw: Option<&str>, default: &str) -> Self {
        match raw {
            Some(EPHEMERAL_SESSION) => Self::Ephemeral,
            Some(name) => Self::Named(name.to_string()),
            None => Self::Named(default.to_string()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Named(_))
    }

    /// Name of the interpreter instance the evaluation is routed to.
    /// Ephemeral evaluations share one scratch instance named `none`.
    pub fn session_name(&self) -> &str {
        match self {
            Self::Ephemeral => EPHEMERAL_SESSION,
            Self::Named(name) => name,
        }
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::Named(DEFAULT_SESSION.to_string())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.session_name())
    }
}

/// A variable value substituted into the block as a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Nothing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl VarValue {
    /// Classify a raw textual value: integer, then float, then bool, else string.
    pub fn parse(raw: &str) -> Self {
        let t = raw.trim();
        if let Ok(i) = t.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = t.parse::<f64>() {
            if f.is_finite() {
                return Self::Float(f);
            }
        }
        match t {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Str(raw.to_string()),
        }
    }

    /// Julia literal for this value.
    pub fn to_julia(&self) -> String {
        match self {
            Self::Nothing => "nothing".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            // Debug keeps the decimal point on integral floats (`2.0`).
            Self::Float(f) => format!("{:?}", f),
            Self::Str(s) => julia_string(s),
        }
    }
}

/// Block header parameters recognized by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Params {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prologue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epilogue: Option<String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub result_params: BTreeSet<String>,
    /// Ordered `var` pairs.
    #[serde(default, rename = "var")]
    pub vars: Vec<(String, VarValue)>,
    /// Target of the graphics directives, per the caller's file convention.
    #[serde(default, rename = "file", skip_serializing_if = "Option::is_none")]
    pub graphics_file: Option<PathBuf>,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

impl Default for Params {
    fn default() -> Self {
        Self {
            prologue: None,
            epilogue: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            result_params: BTreeSet::new(),
            vars: Vec::new(),
            graphics_file: None,
        }
    }
}

impl Params {
    pub fn wants_graphics(&self) -> bool {
        self.result_params.contains("graphics")
    }
}

/// One block evaluation. Built once per block, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    pub body: String,
    pub result_kind: ResultKind,
    pub session: SessionKey,
    pub params: Params,
}

impl EvaluationRequest {
    pub fn new(body: impl Into<String>, result_kind: ResultKind, session: SessionKey) -> Self {
        Self {
            body: body.into(),
            result_kind,
            session,
            params: Params::default(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// Wire form of a request as written by a host document (JSON).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequestSpec {
    pub body: String,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub result_type: ResultKind,
    #[serde(flatten)]
    pub params: Params,
}

impl RequestSpec {
    pub fn into_request(self, default_session: &str) -> EvaluationRequest {
        EvaluationRequest {
            body: self.body,
            result_kind: self.result_type,
            session: SessionKey::resolve(self.session.as_deref(), default_session),
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_resolution() {
        assert_eq!(SessionKey::resolve(None, "main"), SessionKey::Named("main".into()));
        assert_eq!(SessionKey::resolve(Some("none"), "main"), SessionKey::Ephemeral);
        assert_eq!(SessionKey::resolve(Some("work"), "main"), SessionKey::Named("work".into()));
        assert!(!SessionKey::Ephemeral.is_persistent());
        assert_eq!(SessionKey::Ephemeral.session_name(), "none");
    }

    #[test]
    fn test_var_value_parse() {
        assert_eq!(VarValue::parse("42"), VarValue::Int(42));
        assert_eq!(VarValue::parse("-1.5"), VarValue::Float(-1.5));
        assert_eq!(VarValue::parse("true"), VarValue::Bool(true));
        assert_eq!(VarValue::parse("inf"), VarValue::Str("inf".into()));
        assert_eq!(VarValue::parse("hello world"), VarValue::Str("hello world".into()));
    }

    #[test]
    fn test_var_value_literals() {
        assert_eq!(VarValue::Float(2.0).to_julia(), "2.0");
        assert_eq!(VarValue::Int(-3).to_julia(), "-3");
        assert_eq!(VarValue::Nothing.to_julia(), "nothing");
        assert_eq!(VarValue::Str("a \"q\"".into()).to_julia(), r#""a \"q\"""#);
        assert_eq!(VarValue::Str("\u{1b}[0m".into()).to_julia(), r#""\u001b[0m""#);
    }

    #[test]
    fn test_request_spec_from_json() {
        let json = r#"{
            "body": "plot(1:3)",
            "session": "none",
            "result-type": "output",
            "var": [["x", 1], ["name", "jl"]],
            "result-params": ["graphics"],
            "file": "out.png",
            "width": 800
        }"#;
        let spec: RequestSpec = serde_json::from_str(json).unwrap();
        let req = spec.into_request("main");
        assert_eq!(req.session, SessionKey::Ephemeral);
        assert_eq!(req.result_kind, ResultKind::Output);
        assert_eq!(req.params.width, 800);
        assert_eq!(req.params.height, DEFAULT_HEIGHT);
        assert!(req.params.wants_graphics());
        assert_eq!(req.params.vars[0], ("x".to_string(), VarValue::Int(1)));
        assert_eq!(req.params.vars[1], ("name".to_string(), VarValue::Str("jl".into())));
    }

    #[test]
    fn test_request_spec_defaults() {
        let spec: RequestSpec = serde_json::from_str(r#"{"body": "1+1"}"#).unwrap();
        let req = spec.into_request("main");
        assert_eq!(req.session, SessionKey::Named("main".into()));
        assert_eq!(req.result_kind, ResultKind::Value);
        assert_eq!(req.params, Params::default());
    }
}
