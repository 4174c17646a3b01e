//! A small, deterministic template engine for source emission.
//!
//! Templates interleave literal text with actions delimited by
//! `{{ … }}`:
//!
//! * `{{ .Type.Name }}` — expression substitution; dotted paths walk
//!   fields of the current context value.
//! * `{{ if EXPR }} … {{ else }} … {{ end }}` — conditionals.
//! * `{{ range EXPR }} … {{ end }}` — iteration; the context value is
//!   rebound to each element.
//! * `{{ $name := EXPR }}` — variable assignment, `{{ $name }}` reads.
//! * `{{ helper ARG… }}` — calls a helper function bound on the
//!   emitting buffer. `or`, `and`, and `not` are built in.
//!
//! Expansion is deterministic: the same template, bindings, and
//! helpers always produce the same output. Unresolved names — unknown
//! bindings, fields, variables, or helpers — are errors, never empty
//! output.
//!
//! Control actions that stand alone on a line are trimmed together
//! with the line, so templates can be indented for readability
//! without leaking blank lines into the output.

mod value;

pub use value::{Args, Value};

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

/// A helper function callable from template expressions.
pub type HelperFn<'a> = Box<dyn Fn(&[Value<'a>]) -> Result<Value<'a>, TemplateError> + 'a>;

/// A set of named helper functions.
///
/// Stored in a `BTreeMap` so that diagnostic listings are ordered.
#[derive(Default)]
pub struct Helpers<'a> {
    map: BTreeMap<String, HelperFn<'a>>,
}

impl<'a> Helpers<'a> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a helper. A later binding with the same name shadows an
    /// earlier one.
    pub fn bind<F>(&mut self, name: &str, helper: F)
    where
        F: Fn(&[Value<'a>]) -> Result<Value<'a>, TemplateError> + 'a,
    {
        self.map.insert(name.to_owned(), Box::new(helper));
    }

    fn get(&self, name: &str) -> Option<&HelperFn<'a>> {
        self.map.get(name)
    }
}

impl std::fmt::Debug for Helpers<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("template syntax error: {message}")]
    Syntax { message: String },
    #[error("unknown helper `{0}`")]
    UnknownHelper(String),
    #[error("unknown field `{field}` on {on}")]
    UnknownField { field: String, on: &'static str },
    #[error("unknown variable `${0}`")]
    UnknownVariable(String),
    #[error("reference to `{name}` doesn't resolve")]
    UnresolvedReference { name: String },
    #[error("argument {index} should be a {expected}, but is a {found}")]
    WrongArgument {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("argument {index} is missing")]
    MissingArgument { index: usize },
    #[error("a {kind} can't be rendered as text")]
    NotRenderable { kind: &'static str },
    #[error("a {kind} can't be iterated")]
    NotIterable { kind: &'static str },
    /// A helper function failed with a domain error.
    #[error("{0}")]
    Helper(String),
}

impl TemplateError {
    fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }
}

/// A parsed template, ready for expansion.
#[derive(Debug)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parses a template source.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let pieces = trim_standalone(tokenize(source)?);
        let mut parser = Parser {
            pieces: pieces.into_iter().peekable(),
        };
        let nodes = parser.block(&mut Vec::new())?;
        Ok(Self { nodes })
    }

    /// Expands this template with the given root context and helpers.
    pub fn render<'a>(
        &self,
        root: &Value<'a>,
        helpers: &Helpers<'a>,
    ) -> Result<String, TemplateError> {
        let mut renderer = Renderer {
            helpers,
            vars: FxHashMap::default(),
            out: String::new(),
        };
        renderer.block(&self.nodes, root)?;
        Ok(renderer.out)
    }
}

/// Parses and expands a template in one step.
pub fn expand<'a>(
    source: &str,
    root: &Value<'a>,
    helpers: &Helpers<'a>,
) -> Result<String, TemplateError> {
    Template::parse(source)?.render(root, helpers)
}

// MARK: Lexing

#[derive(Debug)]
enum Piece {
    Text(String),
    Action(String),
}

fn tokenize(source: &str) -> Result<Vec<Piece>, TemplateError> {
    let mut pieces = Vec::new();
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            pieces.push(Piece::Text(rest[..start].to_owned()));
        }
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| TemplateError::syntax("unclosed `{{` action"))?;
        pieces.push(Piece::Action(after[..end].trim().to_owned()));
        rest = &after[end + 2..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Text(rest.to_owned()));
    }
    Ok(pieces)
}

/// Whether an action is a control action, eligible for standalone
/// line trimming.
fn is_control(body: &str) -> bool {
    body == "else"
        || body == "end"
        || body.starts_with("if ")
        || body.starts_with("range ")
        || (body.starts_with('$') && body.contains(":="))
}

/// Removes the line around control actions that stand alone on it:
/// the whitespace before the action back to the previous newline, and
/// the whitespace after it through the following newline.
fn trim_standalone(mut pieces: Vec<Piece>) -> Vec<Piece> {
    for index in 0..pieces.len() {
        let Piece::Action(body) = &pieces[index] else {
            continue;
        };
        if !is_control(body) {
            continue;
        }

        let left_ok = match index.checked_sub(1).map(|prev| &pieces[prev]) {
            None => true,
            Some(Piece::Text(text)) => {
                let tail = text.rsplit('\n').next().unwrap_or(text);
                tail.chars().all(|c| c == ' ' || c == '\t')
            }
            Some(Piece::Action(_)) => false,
        };
        let right_ok = match pieces.get(index + 1) {
            None => true,
            Some(Piece::Text(text)) => {
                let head: String = text.chars().take_while(|&c| c != '\n').collect();
                text.contains('\n') && head.chars().all(|c| c == ' ' || c == '\t')
            }
            Some(Piece::Action(_)) => false,
        };
        if !(left_ok && right_ok) {
            continue;
        }

        if let Some(Piece::Text(text)) = index.checked_sub(1).map(|prev| &mut pieces[prev]) {
            match text.rfind('\n') {
                Some(newline) => text.truncate(newline + 1),
                None => text.clear(),
            }
        }
        if let Some(Piece::Text(text)) = pieces.get_mut(index + 1) {
            match text.find('\n') {
                Some(newline) => *text = text[newline + 1..].to_owned(),
                None => text.clear(),
            }
        }
    }
    pieces
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    /// A bare identifier: a helper name, or `true`/`false`.
    Ident(String),
    /// A dotted path rooted at the context value: `.`, `.Name`,
    /// `.Type.Name`.
    Path(Vec<String>),
    /// A variable reference with an optional trailing path:
    /// `$x`, `$x.Name`.
    Var(String, Vec<String>),
    Str(String),
    Int(i64),
    Assign,
    LParen,
    RParen,
}

fn lex_action(body: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = body.char_indices().peekable();
    while let Some(&(index, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ':' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '=')) => {
                        chars.next();
                        tokens.push(Token::Assign);
                    }
                    _ => return Err(TemplateError::syntax(format!("stray `:` in `{body}`"))),
                }
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, 'n')) => text.push('\n'),
                            Some((_, 't')) => text.push('\t'),
                            Some((_, c)) => text.push(c),
                            None => {
                                return Err(TemplateError::syntax(format!(
                                    "unterminated string in `{body}`"
                                )));
                            }
                        },
                        Some((_, c)) => text.push(c),
                        None => {
                            return Err(TemplateError::syntax(format!(
                                "unterminated string in `{body}`"
                            )));
                        }
                    }
                }
                tokens.push(Token::Str(text));
            }
            '.' => {
                tokens.push(Token::Path(lex_path(&mut chars)?));
            }
            '$' => {
                chars.next();
                let name = lex_ident(&mut chars);
                if name.is_empty() {
                    return Err(TemplateError::syntax(format!(
                        "`$` without a variable name in `{body}`"
                    )));
                }
                let path = match chars.peek() {
                    Some(&(_, '.')) => lex_path(&mut chars)?,
                    _ => Vec::new(),
                };
                tokens.push(Token::Var(name, path));
            }
            c if c.is_ascii_digit() || c == '-' => {
                chars.next();
                let mut digits = String::from(c);
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = digits
                    .parse()
                    .map_err(|_| TemplateError::syntax(format!("bad number `{digits}`")))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident = lex_ident(&mut chars);
                tokens.push(Token::Ident(ident));
            }
            _ => {
                return Err(TemplateError::syntax(format!(
                    "unexpected character `{c}` at offset {index} in `{body}`"
                )));
            }
        }
    }
    Ok(tokens)
}

fn lex_ident(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn lex_path(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<Vec<String>, TemplateError> {
    let mut fields = Vec::new();
    while let Some(&(_, '.')) = chars.peek() {
        chars.next();
        let field = lex_ident(chars);
        if field.is_empty() {
            // A bare `.` is the context value itself; a trailing dot
            // in a longer path is an error.
            if fields.is_empty() {
                return Ok(fields);
            }
            return Err(TemplateError::syntax("trailing `.` in path"));
        }
        fields.push(field);
    }
    Ok(fields)
}

// MARK: Parsing

#[derive(Debug)]
enum Node {
    Text(String),
    Expr(Expr),
    If {
        cond: Expr,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Range {
        over: Expr,
        body: Vec<Node>,
    },
    Assign {
        var: String,
        expr: Expr,
    },
}

#[derive(Debug)]
enum Expr {
    Path(Vec<String>),
    Var(String, Vec<String>),
    Str(String),
    Int(i64),
    Bool(bool),
    Call(String, Vec<Expr>),
}

/// What ended a block: used to match `if`/`range` with `else`/`end`.
#[derive(Debug, Eq, PartialEq)]
enum BlockEnd {
    Eof,
    Else,
    End,
}

struct Parser {
    pieces: std::iter::Peekable<std::vec::IntoIter<Piece>>,
}

impl Parser {
    /// Parses nodes until `end`, `else`, or the end of input, pushing
    /// the terminator into `ends`.
    fn block(&mut self, ends: &mut Vec<BlockEnd>) -> Result<Vec<Node>, TemplateError> {
        let mut nodes = Vec::new();
        loop {
            let Some(piece) = self.pieces.next() else {
                ends.push(BlockEnd::Eof);
                return Ok(nodes);
            };
            match piece {
                Piece::Text(text) => nodes.push(Node::Text(text)),
                Piece::Action(body) => {
                    let tokens = lex_action(&body)?;
                    match tokens.first() {
                        Some(Token::Ident(ident)) if ident == "end" => {
                            ends.push(BlockEnd::End);
                            return Ok(nodes);
                        }
                        Some(Token::Ident(ident)) if ident == "else" => {
                            ends.push(BlockEnd::Else);
                            return Ok(nodes);
                        }
                        Some(Token::Ident(ident)) if ident == "if" => {
                            let cond = parse_expr(&tokens[1..])?;
                            let mut end = Vec::new();
                            let then = self.block(&mut end)?;
                            let otherwise = match end[0] {
                                BlockEnd::Else => {
                                    let mut end = Vec::new();
                                    let otherwise = self.block(&mut end)?;
                                    if end[0] != BlockEnd::End {
                                        return Err(TemplateError::syntax(
                                            "`else` without a closing `end`",
                                        ));
                                    }
                                    otherwise
                                }
                                BlockEnd::End => Vec::new(),
                                BlockEnd::Eof => {
                                    return Err(TemplateError::syntax(
                                        "`if` without a closing `end`",
                                    ));
                                }
                            };
                            nodes.push(Node::If {
                                cond,
                                then,
                                otherwise,
                            });
                        }
                        Some(Token::Ident(ident)) if ident == "range" => {
                            let over = parse_expr(&tokens[1..])?;
                            let mut end = Vec::new();
                            let inner = self.block(&mut end)?;
                            if end[0] != BlockEnd::End {
                                return Err(TemplateError::syntax(
                                    "`range` without a closing `end`",
                                ));
                            }
                            nodes.push(Node::Range { over, body: inner });
                        }
                        Some(Token::Var(name, path))
                            if path.is_empty() && tokens.get(1) == Some(&Token::Assign) =>
                        {
                            let expr = parse_expr(&tokens[2..])?;
                            nodes.push(Node::Assign {
                                var: name.clone(),
                                expr,
                            });
                        }
                        Some(_) => nodes.push(Node::Expr(parse_expr(&tokens)?)),
                        None => {
                            return Err(TemplateError::syntax("empty action"));
                        }
                    }
                }
            }
        }
    }
}

fn parse_expr(tokens: &[Token]) -> Result<Expr, TemplateError> {
    let mut cursor = 0;
    let expr = parse_call_or_primary(tokens, &mut cursor)?;
    if cursor != tokens.len() {
        return Err(TemplateError::syntax("trailing tokens in expression"));
    }
    Ok(expr)
}

fn parse_call_or_primary(tokens: &[Token], cursor: &mut usize) -> Result<Expr, TemplateError> {
    match tokens.get(*cursor) {
        Some(Token::Ident(ident)) if ident != "true" && ident != "false" => {
            let name = ident.clone();
            *cursor += 1;
            let mut args = Vec::new();
            while *cursor < tokens.len() && tokens[*cursor] != Token::RParen {
                args.push(parse_primary(tokens, cursor)?);
            }
            Ok(Expr::Call(name, args))
        }
        _ => parse_primary(tokens, cursor),
    }
}

fn parse_primary(tokens: &[Token], cursor: &mut usize) -> Result<Expr, TemplateError> {
    let token = tokens
        .get(*cursor)
        .ok_or_else(|| TemplateError::syntax("expected an expression"))?;
    *cursor += 1;
    match token {
        Token::Path(fields) => Ok(Expr::Path(fields.clone())),
        Token::Var(name, path) => Ok(Expr::Var(name.clone(), path.clone())),
        Token::Str(text) => Ok(Expr::Str(text.clone())),
        Token::Int(value) => Ok(Expr::Int(*value)),
        Token::Ident(ident) if ident == "true" => Ok(Expr::Bool(true)),
        Token::Ident(ident) if ident == "false" => Ok(Expr::Bool(false)),
        Token::Ident(ident) => {
            // A bare helper call with no arguments, in argument
            // position: only valid inside parentheses.
            Ok(Expr::Call(ident.clone(), Vec::new()))
        }
        Token::LParen => {
            let inner = parse_call_or_primary(tokens, cursor)?;
            match tokens.get(*cursor) {
                Some(Token::RParen) => {
                    *cursor += 1;
                    Ok(inner)
                }
                _ => Err(TemplateError::syntax("unbalanced `(`")),
            }
        }
        Token::RParen => Err(TemplateError::syntax("unbalanced `)`")),
        Token::Assign => Err(TemplateError::syntax("`:=` outside an assignment")),
    }
}

// MARK: Rendering

struct Renderer<'a, 'h> {
    helpers: &'h Helpers<'a>,
    vars: FxHashMap<String, Value<'a>>,
    out: String,
}

impl<'a> Renderer<'a, '_> {
    fn block(&mut self, nodes: &[Node], dot: &Value<'a>) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Expr(expr) => {
                    let value = self.eval(expr, dot)?;
                    self.out.push_str(&value.render()?);
                }
                Node::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    if self.eval(cond, dot)?.truthy() {
                        self.block(then, dot)?;
                    } else {
                        self.block(otherwise, dot)?;
                    }
                }
                Node::Range { over, body } => {
                    let value = self.eval(over, dot)?;
                    for item in value.iterate()? {
                        self.block(body, item)?;
                    }
                }
                Node::Assign { var, expr } => {
                    let value = self.eval(expr, dot)?;
                    self.vars.insert(var.clone(), value);
                }
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr, dot: &Value<'a>) -> Result<Value<'a>, TemplateError> {
        match expr {
            Expr::Path(fields) => walk(dot.clone(), fields),
            Expr::Var(name, fields) => {
                let value = self
                    .vars
                    .get(name)
                    .ok_or_else(|| TemplateError::UnknownVariable(name.clone()))?;
                walk(value.clone(), fields)
            }
            Expr::Str(text) => Ok(Value::Str(text.clone())),
            Expr::Int(value) => Ok(Value::Int(*value)),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Call(name, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, dot))
                    .collect::<Result<Vec<_>, _>>()?;
                match name.as_str() {
                    // Short-circuiting boolean builtins, like Go's.
                    "or" => Ok(args
                        .iter()
                        .find(|value| value.truthy())
                        .or(args.last())
                        .cloned()
                        .unwrap_or(Value::Null)),
                    "and" => Ok(args
                        .iter()
                        .find(|value| !value.truthy())
                        .or(args.last())
                        .cloned()
                        .unwrap_or(Value::Null)),
                    "not" => Ok(Value::Bool(!args.arg(0)?.truthy())),
                    // Concatenates the renderings of its arguments.
                    "cat" => {
                        let mut out = String::new();
                        for value in &args {
                            out.push_str(&value.render()?);
                        }
                        Ok(Value::Str(out))
                    }
                    _ => match self.helpers.get(name) {
                        Some(helper) => helper(&args),
                        None => Err(TemplateError::UnknownHelper(name.clone())),
                    },
                }
            }
        }
    }
}

fn walk<'a>(mut value: Value<'a>, fields: &[String]) -> Result<Value<'a>, TemplateError> {
    for field in fields {
        value = value.field(field)?;
    }
    Ok(value)
}
