//! Boolean formulas over affix keywords.
//!
//! Users write `冰霜 && (攻速 || 暴击)` or `fire || !cold`. The formula is
//! rewritten to word connectives, tokenized and parsed by recursive descent
//! into an [`Expr`] tree. Atoms are free text; resolving them to booleans is up
//! to the caller, so nothing here can execute anything but connectives.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or      := and ( "or" and )*
//! and     := unary ( "and" unary )*
//! unary   := "not" unary | primary
//! primary := "(" or ")" | "true" | "false" | atom
//! ```

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
	/// Keyword whose presence in the text decides its value.
	Atom(String),
	Literal(bool),
	Not(Box<Expr>),
	And(Vec<Expr>),
	Or(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
	#[error("expression is empty")]
	Empty,
	#[error("expression ends unexpectedly")]
	UnexpectedEnd,
	#[error("unexpected `{0}`")]
	Unexpected(String),
	#[error("missing closing parenthesis")]
	UnclosedParen,
	#[error("unexpected trailing `{0}`")]
	Trailing(String),
	#[error("expression nests deeper than {0} levels")]
	TooDeep(usize),
}

/// Nesting limit for parentheses and negations.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	And,
	Or,
	Not,
	Open,
	Close,
	Literal(bool),
	Atom(String),
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::And => f.write_str("and"),
			Token::Or => f.write_str("or"),
			Token::Not => f.write_str("not"),
			Token::Open => f.write_str("("),
			Token::Close => f.write_str(")"),
			Token::Literal(v) => write!(f, "{v}"),
			Token::Atom(text) => f.write_str(text),
		}
	}
}

/// Whether a rule string should be treated as a formula rather than a keyword.
pub fn looks_like_expression(text: &str) -> bool {
	if text.contains("&&") || text.contains("||") {
		return true;
	}
	match (text.find('('), text.rfind(')')) {
		(Some(open), Some(close)) => open < close,
		_ => false,
	}
}

impl Expr {
	pub fn parse(source: &str) -> Result<Self, ExprError> {
		let tokens = tokenize(&rewrite_connectives(source));
		if tokens.is_empty() {
			return Err(ExprError::Empty);
		}

		let mut parser = Parser { tokens, pos: 0, depth: 0 };
		let expr = parser.parse_or()?;
		match parser.tokens.get(parser.pos) {
			None => Ok(expr),
			Some(token) => Err(ExprError::Trailing(token.to_string())),
		}
	}

	/// Evaluates the tree, asking `resolve` for the value of each atom it reaches.
	pub fn eval(&self, resolve: &mut impl FnMut(&str) -> bool) -> bool {
		match self {
			Expr::Atom(name) => resolve(name),
			Expr::Literal(v) => *v,
			Expr::Not(inner) => !inner.eval(resolve),
			Expr::And(terms) => terms.iter().all(|t| t.eval(resolve)),
			Expr::Or(terms) => terms.iter().any(|t| t.eval(resolve)),
		}
	}

	/// Distinct atoms in order of first appearance.
	pub fn atoms(&self) -> Vec<&str> {
		fn walk<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
			match expr {
				Expr::Atom(name) => {
					if !out.contains(&name.as_str()) {
						out.push(name);
					}
				}
				Expr::Literal(_) => {}
				Expr::Not(inner) => walk(inner, out),
				Expr::And(terms) | Expr::Or(terms) => terms.iter().for_each(|t| walk(t, out)),
			}
		}

		let mut out = Vec::new();
		walk(self, &mut out);
		out
	}
}

fn rewrite_connectives(source: &str) -> String {
	source
		.replace("&&", " and ")
		.replace("||", " or ")
		.replace('!', " not ")
}

fn tokenize(source: &str) -> Vec<Token> {
	let mut tokens = Vec::new();
	let mut word = String::new();

	let flush = |word: &mut String, tokens: &mut Vec<Token>| {
		if word.is_empty() {
			return;
		}
		let token = match word.as_str() {
			"and" => Token::And,
			"or" => Token::Or,
			"not" => Token::Not,
			"true" | "True" => Token::Literal(true),
			"false" | "False" => Token::Literal(false),
			other => Token::Atom(other.to_string()),
		};
		word.clear();

		// Words separated only by spaces form one multi-word keyword.
		if let (Token::Atom(next), Some(Token::Atom(prev))) = (&token, tokens.last_mut()) {
			prev.push(' ');
			prev.push_str(next);
			return;
		}
		tokens.push(token);
	};

	for c in source.chars() {
		match c {
			'(' | ')' => {
				flush(&mut word, &mut tokens);
				tokens.push(if c == '(' { Token::Open } else { Token::Close });
			}
			c if c.is_whitespace() => flush(&mut word, &mut tokens),
			c => word.push(c),
		}
	}
	flush(&mut word, &mut tokens);

	tokens
}

struct Parser {
	tokens: Vec<Token>,
	pos: usize,
	/// Current `parse_unary` nesting; every recursion passes through it.
	depth: usize,
}

impl Parser {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	fn eat(&mut self, token: &Token) -> bool {
		if self.peek() == Some(token) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn parse_or(&mut self) -> Result<Expr, ExprError> {
		let mut terms = vec![self.parse_and()?];
		while self.eat(&Token::Or) {
			terms.push(self.parse_and()?);
		}
		Ok(if terms.len() == 1 { terms.remove(0) } else { Expr::Or(terms) })
	}

	fn parse_and(&mut self) -> Result<Expr, ExprError> {
		let mut terms = vec![self.parse_unary()?];
		while self.eat(&Token::And) {
			terms.push(self.parse_unary()?);
		}
		Ok(if terms.len() == 1 { terms.remove(0) } else { Expr::And(terms) })
	}

	fn parse_unary(&mut self) -> Result<Expr, ExprError> {
		if self.depth >= MAX_DEPTH {
			return Err(ExprError::TooDeep(MAX_DEPTH));
		}
		self.depth += 1;
		let parsed = if self.eat(&Token::Not) {
			self.parse_unary().map(|inner| Expr::Not(Box::new(inner)))
		} else {
			self.parse_primary()
		};
		self.depth -= 1;
		parsed
	}

	fn parse_primary(&mut self) -> Result<Expr, ExprError> {
		let token = self.peek().cloned().ok_or(ExprError::UnexpectedEnd)?;
		self.pos += 1;
		match token {
			Token::Open => {
				let inner = self.parse_or()?;
				if self.eat(&Token::Close) {
					Ok(inner)
				} else {
					Err(ExprError::UnclosedParen)
				}
			}
			Token::Literal(v) => Ok(Expr::Literal(v)),
			Token::Atom(name) => Ok(Expr::Atom(name)),
			other => Err(ExprError::Unexpected(other.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn atom(s: &str) -> Expr {
		Expr::Atom(s.to_string())
	}

	#[test]
	fn parses_symbol_connectives() {
		assert_eq!(
			Expr::parse("A && (B || C)").unwrap(),
			Expr::And(vec![atom("A"), Expr::Or(vec![atom("B"), atom("C")])])
		);
		assert_eq!(
			Expr::parse("!A || B").unwrap(),
			Expr::Or(vec![Expr::Not(Box::new(atom("A"))), atom("B")])
		);
	}

	#[test]
	fn and_binds_tighter_than_or() {
		assert_eq!(
			Expr::parse("a || b && c").unwrap(),
			Expr::Or(vec![atom("a"), Expr::And(vec![atom("b"), atom("c")])])
		);
	}

	#[test]
	fn cjk_and_multi_word_atoms() {
		let expr = Expr::parse("冰霜 && (攻击 速度||暴击率)").unwrap();
		assert_eq!(expr.atoms(), vec!["冰霜", "攻击 速度", "暴击率"]);
		let expr = Expr::parse("技能等级+3 && 冰霜").unwrap();
		assert_eq!(expr.atoms(), vec!["技能等级+3", "冰霜"]);
	}

	#[test]
	fn literals_and_double_negation() {
		assert_eq!(Expr::parse("not not true").unwrap().eval(&mut |_| false), true);
		assert_eq!(Expr::parse("False || x").unwrap().eval(&mut |_| false), false);
	}

	#[test]
	fn malformed_formulas_are_errors() {
		assert_eq!(Expr::parse(""), Err(ExprError::Empty));
		assert_eq!(Expr::parse("   "), Err(ExprError::Empty));
		assert_eq!(Expr::parse("a &&"), Err(ExprError::UnexpectedEnd));
		assert_eq!(Expr::parse("(a || b"), Err(ExprError::UnclosedParen));
		assert_eq!(Expr::parse("a || b)"), Err(ExprError::Trailing(")".into())));
		assert_eq!(Expr::parse("&& a"), Err(ExprError::Unexpected("and".into())));
		assert_eq!(Expr::parse("()"), Err(ExprError::Unexpected(")".into())));
	}

	#[test]
	fn nesting_is_bounded() {
		let nested = |depth: usize| format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
		assert_eq!(Expr::parse(&nested(50)).unwrap(), atom("a"));
		assert_eq!(Expr::parse(&nested(1000)), Err(ExprError::TooDeep(MAX_DEPTH)));
		assert_eq!(Expr::parse(&"!".repeat(5000)), Err(ExprError::TooDeep(MAX_DEPTH)));
	}

	#[test]
	fn evaluation_follows_truth_table() {
		let expr = Expr::parse("A && (B || C)").unwrap();
		for bits in 0..8u8 {
			let (a, b, c) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
			let got = expr.eval(&mut |name| match name {
				"A" => a,
				"B" => b,
				"C" => c,
				_ => unreachable!(),
			});
			assert_eq!(got, a && (b || c), "A={a} B={b} C={c}");
		}
	}

	#[test]
	fn detects_expression_shape() {
		assert!(looks_like_expression("a && b"));
		assert!(looks_like_expression("a || b"));
		assert!(looks_like_expression("(a)"));
		assert!(!looks_like_expression("冰霜抗性"));
		assert!(!looks_like_expression(")a("));
		assert!(!looks_like_expression("a (b"));
	}
}
