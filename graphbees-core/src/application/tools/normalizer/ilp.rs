//! Mixed ILP model normalization.
//!
//! Constraints and the objective arrive as linear expressions in text, for
//! example `"2x + y <= 10"`. They are parsed here into coefficient form so
//! the worker only ever receives numbers and variable references.

use super::reader::{Args, as_f64, preview};
use super::ValidationError;
use crate::domain::input::{
    IlpVariable, LinearConstraint, LinearExpr, LinearTerm, MixedIlpInput, Relation, Sense,
    VarType,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

pub(super) fn mixed_ilp(args: &Args<'_>) -> Result<MixedIlpInput, ValidationError> {
    let variables = variables(args.array("variables")?)?;
    let order: HashMap<&str, usize> = variables
        .iter()
        .enumerate()
        .map(|(index, var)| (var.name.as_str(), index))
        .collect();

    let raw_constraints = args.array("constraints")?;
    if raw_constraints.is_empty() {
        return Err(ValidationError::new(
            "constraints",
            "at least one constraint is required",
        ));
    }
    let constraints = raw_constraints
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let text = raw.as_str().ok_or_else(|| {
                ValidationError::new("constraints", format!("constraint {index} must be a string"))
            })?;
            parse_constraint(text, &order).map_err(|reason| {
                ValidationError::new(
                    "constraints",
                    format!("constraint {index} ('{text}'): {reason}"),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let objective = match args.opt_str("objective")? {
        Some(text) if !text.trim().is_empty() => {
            let expr = parse_expression(text, &order)
                .map_err(|reason| ValidationError::new("objective", reason))?;
            if expr.terms.is_empty() {
                return Err(ValidationError::new(
                    "objective",
                    "must reference at least one variable",
                ));
            }
            Some(expr)
        }
        _ => None,
    };

    let sense = match args.opt_str("sense")? {
        None => Sense::default(),
        Some(text) => parse_sense(text).ok_or_else(|| {
            ValidationError::new("sense", format!("must be Max or Min, got '{text}'"))
        })?,
    };

    Ok(MixedIlpInput {
        variables,
        constraints,
        objective,
        sense,
    })
}

fn parse_sense(text: &str) -> Option<Sense> {
    match text.trim().to_ascii_lowercase().as_str() {
        "max" | "maximize" | "maximise" => Some(Sense::Max),
        "min" | "minimize" | "minimise" => Some(Sense::Min),
        _ => None,
    }
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn variables(raw: &[Value]) -> Result<Vec<IlpVariable>, ValidationError> {
    const FIELD: &str = "variables";
    if raw.is_empty() {
        return Err(ValidationError::new(FIELD, "at least one variable is required"));
    }
    let mut seen = HashSet::new();
    raw.iter()
        .map(|entry| {
            let variable = match entry {
                Value::String(name) => IlpVariable {
                    name: name.trim().to_string(),
                    lower_bound: None,
                    upper_bound: None,
                    var_type: VarType::Continuous,
                },
                Value::Object(map) => {
                    let name = map
                        .get("name")
                        .and_then(Value::as_str)
                        .ok_or_else(|| ValidationError::new(FIELD, "every variable needs a name"))?
                        .trim()
                        .to_string();
                    let bound = |key: &str| {
                        map.get(key)
                            .filter(|value| !value.is_null())
                            .map(|value| as_f64(FIELD, value))
                            .transpose()
                    };
                    let var_type = match map.get("var_type").and_then(Value::as_str) {
                        None => VarType::Continuous,
                        Some(kind) => match kind.trim().to_ascii_lowercase().as_str() {
                            "continuous" => VarType::Continuous,
                            "integer" => VarType::Integer,
                            "binary" => VarType::Binary,
                            other => {
                                return Err(ValidationError::new(
                                    FIELD,
                                    format!(
                                        "variable '{name}' has unsupported var_type '{other}' (use continuous, integer or binary)"
                                    ),
                                ));
                            }
                        },
                    };
                    IlpVariable {
                        lower_bound: bound("lower_bound")?,
                        upper_bound: bound("upper_bound")?,
                        name,
                        var_type,
                    }
                }
                other => {
                    return Err(ValidationError::new(
                        FIELD,
                        format!("expected a variable object, got {}", preview(other)),
                    ));
                }
            };

            if !valid_name(&variable.name) {
                return Err(ValidationError::new(
                    FIELD,
                    format!("invalid variable name '{}'", variable.name),
                ));
            }
            if !seen.insert(variable.name.clone()) {
                return Err(ValidationError::new(
                    FIELD,
                    format!("variable '{}' is declared twice", variable.name),
                ));
            }
            if let (Some(lower), Some(upper)) = (variable.lower_bound, variable.upper_bound) {
                if lower > upper {
                    return Err(ValidationError::new(
                        FIELD,
                        format!(
                            "variable '{}' has lower bound {lower} above upper bound {upper}",
                            variable.name
                        ),
                    ));
                }
            }
            Ok(variable)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Cmp(Relation),
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '<' | '>' | '=' => {
                let next = chars.get(i + 1).copied();
                let relation = match (c, next) {
                    ('<', Some('=')) => Relation::LessEq,
                    ('>', Some('=')) => Relation::GreaterEq,
                    ('=', Some('=')) => Relation::Equal,
                    ('=', _) => Relation::Equal,
                    _ => return Err(format!("strict '{c}' is not supported; use '{c}='")),
                };
                tokens.push(Token::Cmp(relation));
                i += if c == '=' && next != Some('=') { 1 } else { 2 };
            }
            '≤' | '≥' | '≠' => {
                return Err(format!(
                    "use ASCII operators (<=, >=, ==) instead of '{c}'"
                ));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| format!("'{literal}' is not a number"))?;
                if !number.is_finite() {
                    return Err(format!("'{literal}' is out of range"));
                }
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '/' | '^' | '(' | ')' => {
                return Err(format!("'{c}' is not supported in a linear expression"));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

/// Coefficients keyed by variable position, plus the constant part.
#[derive(Debug, Default)]
struct Accumulator {
    coefficients: HashMap<usize, f64>,
    constant: f64,
}

impl Accumulator {
    fn add(&mut self, other: Accumulator, factor: f64) {
        for (index, coefficient) in other.coefficients {
            *self.coefficients.entry(index).or_insert(0.0) += factor * coefficient;
        }
        self.constant += factor * other.constant;
    }

    /// Products and sums of finite literals can still overflow.
    fn finite(self) -> Result<Self, String> {
        let overflowed = !self.constant.is_finite()
            || self.coefficients.values().any(|coefficient| !coefficient.is_finite());
        if overflowed {
            return Err("coefficients must be finite".to_string());
        }
        Ok(self)
    }

    fn into_terms(self, names: &[&str]) -> Vec<LinearTerm> {
        let mut terms: Vec<(usize, f64)> = self
            .coefficients
            .into_iter()
            .filter(|(_, coefficient)| *coefficient != 0.0)
            .collect();
        terms.sort_unstable_by_key(|(index, _)| *index);
        terms
            .into_iter()
            .map(|(index, coefficient)| LinearTerm {
                variable: names[index].to_string(),
                coefficient,
            })
            .collect()
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    order: &'a HashMap<&'a str, usize>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn expression(&mut self) -> Result<Accumulator, String> {
        let mut total = Accumulator::default();
        let mut sign = self.signs();
        loop {
            let term = self.term()?;
            total.add(term, sign);
            match self.peek() {
                Some(Token::Plus) | Some(Token::Minus) => sign = self.signs(),
                _ => return Ok(total),
            }
        }
    }

    /// Consumes a run of `+`/`-` and returns the combined sign.
    fn signs(&mut self) -> f64 {
        let mut sign = 1.0;
        while let Some(token) = self.peek() {
            match token {
                Token::Plus => {}
                Token::Minus => sign = -sign,
                _ => break,
            }
            self.pos += 1;
        }
        sign
    }

    fn term(&mut self) -> Result<Accumulator, String> {
        let mut coefficient = 1.0;
        let mut variable: Option<usize> = None;
        let mut factors = 0;
        loop {
            match self.peek() {
                Some(Token::Number(value)) => coefficient *= value,
                Some(Token::Ident(name)) => {
                    let index = *self
                        .order
                        .get(name.as_str())
                        .ok_or_else(|| format!("'{name}' is not a declared variable"))?;
                    if variable.replace(index).is_some() {
                        return Err("products of variables are not linear".to_string());
                    }
                }
                Some(Token::Star) if factors > 0 => {
                    self.pos += 1;
                    if !matches!(self.peek(), Some(Token::Number(_) | Token::Ident(_))) {
                        return Err("'*' must be followed by a number or variable".to_string());
                    }
                    continue;
                }
                _ if factors == 0 => return Err("expected a number or variable".to_string()),
                _ => break,
            }
            factors += 1;
            self.pos += 1;
        }

        let mut term = Accumulator::default();
        match variable {
            Some(index) => {
                term.coefficients.insert(index, coefficient);
            }
            None => term.constant = coefficient,
        }
        Ok(term)
    }
}

fn parse_side(tokens: &[Token], order: &HashMap<&str, usize>) -> Result<Accumulator, String> {
    if tokens.is_empty() {
        return Err("missing expression".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        order,
    };
    let expr = parser.expression()?;
    if parser.pos != tokens.len() {
        return Err("unexpected trailing input".to_string());
    }
    Ok(expr)
}

fn names<'a>(order: &HashMap<&'a str, usize>) -> Vec<&'a str> {
    let mut names = vec![""; order.len()];
    for (&name, &index) in order {
        names[index] = name;
    }
    names
}

fn parse_expression(text: &str, order: &HashMap<&str, usize>) -> Result<LinearExpr, String> {
    let tokens = tokenize(text)?;
    if tokens.iter().any(|token| matches!(token, Token::Cmp(_))) {
        return Err("an expression cannot contain a comparison".to_string());
    }
    let expr = parse_side(&tokens, order)?.finite()?;
    let constant = expr.constant;
    Ok(LinearExpr {
        terms: expr.into_terms(&names(order)),
        constant,
    })
}

fn parse_constraint(text: &str, order: &HashMap<&str, usize>) -> Result<LinearConstraint, String> {
    let tokens = tokenize(text)?;
    let comparisons: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| matches!(token, Token::Cmp(_)))
        .map(|(index, _)| index)
        .collect();
    let split = match comparisons.as_slice() {
        [index] => *index,
        [] => return Err("missing comparison operator (<=, >=, ==)".to_string()),
        _ => return Err("chained comparisons are not supported".to_string()),
    };
    let Token::Cmp(relation) = &tokens[split] else {
        return Err("missing comparison operator".to_string());
    };
    let relation = *relation;

    let mut lhs = parse_side(&tokens[..split], order)?;
    let rhs = parse_side(&tokens[split + 1..], order)?;
    lhs.add(rhs, -1.0);
    let lhs = lhs.finite()?;

    let rhs = -lhs.constant;
    let terms = lhs.into_terms(&names(order));
    if terms.is_empty() {
        return Err("constraint does not involve any variable".to_string());
    }
    Ok(LinearConstraint {
        terms,
        relation,
        rhs: if rhs == 0.0 { 0.0 } else { rhs },
    })
}

/// Renders `Σ cᵢ*xᵢ` (and a trailing constant when non-zero).
pub(super) fn render_terms(terms: &[LinearTerm], constant: f64) -> String {
    let mut out = String::new();
    for (index, term) in terms.iter().enumerate() {
        let magnitude = term.coefficient.abs();
        match (index, term.coefficient < 0.0) {
            (0, false) => {}
            (0, true) => out.push('-'),
            (_, false) => out.push_str(" + "),
            (_, true) => out.push_str(" - "),
        }
        let _ = write!(out, "{magnitude}*{}", term.variable);
    }
    if constant != 0.0 || out.is_empty() {
        if out.is_empty() {
            let _ = write!(out, "{constant}");
        } else if constant < 0.0 {
            let _ = write!(out, " - {}", constant.abs());
        } else {
            let _ = write!(out, " + {constant}");
        }
    }
    out
}

pub(super) fn render_constraint(constraint: &LinearConstraint) -> String {
    format!(
        "{} {} {}",
        render_terms(&constraint.terms, 0.0),
        constraint.relation.symbol(),
        constraint.rhs
    )
}

pub(super) fn variable_to_json(variable: &IlpVariable) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("name".into(), Value::String(variable.name.clone()));
    if let Some(lower) = variable.lower_bound {
        map.insert("lower_bound".into(), lower.into());
    }
    if let Some(upper) = variable.upper_bound {
        map.insert("upper_bound".into(), upper.into());
    }
    map.insert("var_type".into(), variable.var_type.as_str().into());
    Value::Object(map)
}
