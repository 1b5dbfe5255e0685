//! Build-time selector scoping for component stylesheets.
//!
//! Every compound selector of a scoped stylesheet gains a class named after the stylesheet's
//! [`ScopingToken`], and rendering puts that class on every element of the owning component's
//! template. This gives light DOM components style encapsulation without a shadow root.
//!
//! ```
//! use hydrate_dom::scope::{scope_stylesheet, ScopingToken};
//!
//! let token = ScopingToken::new("x-foo", "foo");
//! let scoped = scope_stylesheet("foo.scoped.css", "div > .bar {}", &token).unwrap();
//! assert_eq!(scoped.css(), "div.x-foo_foo > .bar.x-foo_foo {}");
//! ```

use crate::error::{ScopingError, ScopingErrorKind};
use core::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};

/// Stylesheets are scoped iff their file name ends with this.
pub const SCOPED_STYLESHEET_SUFFIX: &str = ".scoped.css";

/// At-rules whose blocks contain further style rules.
const NESTING_AT_RULES: &[&str] = &["media", "supports", "layer", "container", "document", "-moz-document"];

const ROOT_CONTEXT_PSEUDO_CLASSES: &[&str] = &["host", "host-context", "root"];

/// Identifies one component definition's stylesheet scope. Also a valid CSS class name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopingToken(String);

impl ScopingToken {
	/// `"{component_tag}_{stylesheet_stem}"`, with characters that aren't valid in a class name replaced by `_`.
	#[must_use]
	pub fn new(component_tag: &str, stylesheet_stem: &str) -> Self {
		Self::from_raw(&format!("{}_{}", component_tag, stylesheet_stem))
	}

	#[must_use]
	pub fn from_raw(token: &str) -> Self {
		let mut sanitized: String = token
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() { c } else { '_' })
			.collect();
		if sanitized.is_empty() || sanitized.starts_with(|c: char| c.is_ascii_digit()) {
			sanitized.insert(0, '_');
		}
		Self(sanitized)
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for ScopingToken {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A rewritten stylesheet, ready to be registered against a [`Definition`](`crate::Definition`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedStylesheet {
	token: ScopingToken,
	source_path: PathBuf,
	css: String,
}

impl ScopedStylesheet {
	#[must_use]
	pub fn token(&self) -> &ScopingToken {
		&self.token
	}

	#[must_use]
	pub fn source_path(&self) -> &Path {
		&self.source_path
	}

	#[must_use]
	pub fn css(&self) -> &str {
		&self.css
	}
}

#[must_use]
pub fn is_scoped_stylesheet(path: impl AsRef<Path>) -> bool {
	path.as_ref()
		.file_name()
		.and_then(|name| name.to_str())
		.map_or(false, |name| name.len() > SCOPED_STYLESHEET_SUFFIX.len() && name.ends_with(SCOPED_STYLESHEET_SUFFIX))
}

/// Reads and scopes the stylesheet at `path` for the component `component_tag`.
///
/// Returns `Ok(None)` for unscoped (plain `.css`) stylesheets, which are left alone.
///
/// # Errors
///
/// Iff the file can't be read or [`scope_stylesheet`] fails.
#[instrument]
pub fn compile_stylesheet(path: &Path, component_tag: &str) -> Result<Option<ScopedStylesheet>, ScopingError> {
	if !is_scoped_stylesheet(path) {
		trace!("Not a scoped stylesheet");
		return Ok(None);
	}
	let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
	let stem = &file_name[..file_name.len() - SCOPED_STYLESHEET_SUFFIX.len()];
	let source = std::fs::read_to_string(path).map_err(|error| ScopingError {
		file: path.to_path_buf(),
		selector: String::new(),
		kind: ScopingErrorKind::Io(error.to_string()),
	})?;
	scope_stylesheet(path, &source, &ScopingToken::new(component_tag, stem)).map(Some)
}

/// [`compile_stylesheet`] for each of `paths`. A failing file doesn't affect the others.
pub fn compile_stylesheets<P: AsRef<Path>>(component_tag: &str, paths: impl IntoIterator<Item = P>) -> Vec<Result<Option<ScopedStylesheet>, ScopingError>> {
	paths.into_iter().map(|path| compile_stylesheet(path.as_ref(), component_tag)).collect()
}

/// Scopes every selector in `source` with `token`.
///
/// Comments between top-level rules are dropped, and each comment inside a selector becomes a single space.
/// Declarations and non-nesting at-rules are copied verbatim. Nested style rules are scoped like top-level ones,
/// except that compounds containing `&` already refer to the scoped parent and are left as written.
///
/// # Errors
///
/// - [`ScopingErrorKind::RootContextSelector`] for `:host`, `:host-context` and `:root`, anywhere in a selector (nested or not),
/// - [`ScopingErrorKind::Import`] for `@import`, and
/// - [`ScopingErrorKind::Syntax`] for unterminated comments, strings and blocks, or otherwise malformed rules.
///
/// Nothing is produced for a stylesheet with any error.
#[instrument(skip(source))]
pub fn scope_stylesheet(file: impl AsRef<Path> + fmt::Debug, source: &str, token: &ScopingToken) -> Result<ScopedStylesheet, ScopingError> {
	let file = file.as_ref();
	let css = scope_rules(file, source, token)?;
	debug!("Scoped {} byte(s) of CSS into {} byte(s)", source.len(), css.len());
	Ok(ScopedStylesheet {
		token: token.clone(),
		source_path: file.to_path_buf(),
		css,
	})
}

fn scope_rules(file: &Path, source: &str, token: &ScopingToken) -> Result<String, ScopingError> {
	let syntax = |selector: &str, message: &str| ScopingError {
		file: file.to_path_buf(),
		selector: selector.to_owned(),
		kind: ScopingErrorKind::Syntax(message.to_owned()),
	};

	let mut scanner = Scanner { source, pos: 0 };
	let mut rules = Vec::new();
	loop {
		scanner.skip_trivia().map_err(|message| syntax("", message))?;
		if scanner.at_end() {
			break;
		}

		let start = scanner.pos;
		let stop = scanner.until_top_level(&[b'{', b';', b'}']).map_err(|message| syntax(source[start..].trim(), message))?;
		let prelude = strip_comments(&source[start..scanner.pos]);
		let prelude = prelude.trim();
		let at_rule = at_rule_name(prelude);
		if at_rule.as_deref() == Some("import") {
			return Err(ScopingError {
				file: file.to_path_buf(),
				selector: prelude.to_owned(),
				kind: ScopingErrorKind::Import,
			});
		}

		match stop {
			None => return Err(syntax(prelude, "unexpected end of stylesheet")),
			Some(b';') if at_rule.is_some() => {
				scanner.pos += 1;
				rules.push(format!("{};", prelude))
			}
			Some(b'{') => {
				scanner.pos += 1;
				let block_start = scanner.pos;
				let block_end = scanner.block_end().map_err(|message| syntax(prelude, message))?;
				let block = &source[block_start..block_end];
				rules.push(match at_rule {
					Some(name) if NESTING_AT_RULES.contains(&name.as_str()) => {
						let inner = scope_rules(file, block, token)?;
						format!("{} {{\n{}\n}}", prelude, inner)
					}
					Some(_) => format!("{} {{{}}}", prelude, block),
					None => format!("{} {{{}}}", scope_selector_list(file, prelude, token)?, scope_declarations(file, block, token)?),
				})
			}
			Some(b'}') => return Err(syntax(prelude, "unmatched `}`")),
			Some(_) => return Err(syntax(prelude, "expected `{`")),
		}
	}
	Ok(rules.join("\n"))
}

/// Copies a style rule's block, scoping the selectors of the rules nested in it.
fn scope_declarations(file: &Path, block: &str, token: &ScopingToken) -> Result<String, ScopingError> {
	let syntax = |selector: &str, message: &str| ScopingError {
		file: file.to_path_buf(),
		selector: selector.to_owned(),
		kind: ScopingErrorKind::Syntax(message.to_owned()),
	};

	let mut scanner = Scanner { source: block, pos: 0 };
	let mut scoped = String::with_capacity(block.len());
	let mut copied = 0;
	loop {
		scanner.skip_trivia().map_err(|message| syntax("", message))?;
		if scanner.at_end() {
			break;
		}

		let start = scanner.pos;
		let stop = scanner.until_top_level(&[b'{', b';', b'}']).map_err(|message| syntax(block[start..].trim(), message))?;
		let prelude = strip_comments(&block[start..scanner.pos]);
		let at_rule = at_rule_name(prelude.trim());
		if at_rule.as_deref() == Some("import") {
			return Err(ScopingError {
				file: file.to_path_buf(),
				selector: prelude.trim().to_owned(),
				kind: ScopingErrorKind::Import,
			});
		}

		match stop {
			None => break,
			Some(b';') => scanner.pos += 1,
			Some(b'{') => {
				scanner.pos += 1;
				let inner_start = scanner.pos;
				let inner_end = scanner.block_end().map_err(|message| syntax(prelude.trim(), message))?;
				let inner = &block[inner_start..inner_end];
				scoped.push_str(&block[copied..start]);
				match at_rule {
					Some(name) if NESTING_AT_RULES.contains(&name.as_str()) => {
						scoped.push_str(&prelude);
						scoped.push('{');
						scoped.push_str(&scope_declarations(file, inner, token)?);
						scoped.push('}');
					}
					// Custom property values may contain blocks.
					None if prelude.trim_start().starts_with("--") => scoped.push_str(&block[start..scanner.pos]),
					Some(_) => scoped.push_str(&block[start..scanner.pos]),
					None => {
						trace!("Scoping nested rule {:?}", prelude.trim());
						scoped.push_str(&scope_selector_list(file, &prelude, token)?);
						scoped.push('{');
						scoped.push_str(&scope_declarations(file, inner, token)?);
						scoped.push('}');
					}
				}
				copied = scanner.pos;
			}
			Some(_) => return Err(syntax(prelude.trim(), "unmatched `}`")),
		}
	}
	scoped.push_str(&block[copied..]);
	Ok(scoped)
}

fn at_rule_name(prelude: &str) -> Option<String> {
	let name = prelude.strip_prefix('@')?;
	let end = name.find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_')).unwrap_or_else(|| name.len());
	Some(name[..end].to_ascii_lowercase())
}

fn scope_selector_list(file: &Path, selector_list: &str, token: &ScopingToken) -> Result<String, ScopingError> {
	let error = |kind| ScopingError {
		file: file.to_path_buf(),
		selector: selector_list.to_owned(),
		kind,
	};

	let mut scoped = Vec::new();
	for selector in split_top_level_commas(selector_list) {
		let trimmed = selector.trim();
		if trimmed.is_empty() {
			return Err(error(ScopingErrorKind::Syntax("empty selector".to_owned())));
		}
		if let Some(pseudo) = find_root_context(trimmed) {
			return Err(error(ScopingErrorKind::RootContextSelector(pseudo)));
		}
		let leading = &selector[..selector.len() - selector.trim_start().len()];
		let trailing = &selector[selector.trim_end().len()..];
		scoped.push(format!("{}{}{}", leading, scope_selector(trimmed, token), trailing));
	}
	Ok(scoped.join(","))
}

fn split_top_level_commas(selector_list: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut start = 0;
	for (i, c) in top_level(selector_list) {
		if c == ',' {
			parts.push(&selector_list[start..i]);
			start = i + 1;
		}
	}
	parts.push(&selector_list[start..]);
	parts
}

/// The first root-context pseudo-class in `selector`, including inside functional pseudo-classes.
fn find_root_context(selector: &str) -> Option<String> {
	let mut chars = selector.char_indices().peekable();
	let mut quote = None;
	let mut brackets = 0_usize;
	while let Some((i, c)) = chars.next() {
		match (quote, c) {
			(_, '\\') => {
				chars.next();
			}
			(Some(q), c) if c == q => quote = None,
			(Some(_), _) => (),
			(None, '"') | (None, '\'') => quote = Some(c),
			(None, '[') => brackets += 1,
			(None, ']') => brackets = brackets.saturating_sub(1),
			(None, ':') if brackets == 0 => {
				if chars.peek().map(|&(_, c)| c) == Some(':') {
					chars.next();
					continue;
				}
				let rest = &selector[i + 1..];
				let end = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_')).unwrap_or_else(|| rest.len());
				let name = rest[..end].to_ascii_lowercase();
				if ROOT_CONTEXT_PSEUDO_CLASSES.contains(&name.as_str()) {
					return Some(format!(":{}", name));
				}
			}
			(None, _) => (),
		}
	}
	None
}

/// Appends `.token` to each compound selector. Combinators are copied as written.
fn scope_selector(selector: &str, token: &ScopingToken) -> String {
	let class = format!(".{}", token);

	let mut combinators: Vec<(usize, usize)> = Vec::new();
	for (i, c) in top_level(selector) {
		if c.is_whitespace() || c == '>' || c == '+' || c == '~' {
			match combinators.last_mut() {
				Some((_, end)) if *end == i => *end = i + c.len_utf8(),
				_ => combinators.push((i, i + c.len_utf8())),
			}
		}
	}

	let mut scoped = String::with_capacity(selector.len() + class.len() * (combinators.len() + 1));
	let mut pos = 0;
	for (start, end) in combinators {
		if start > pos {
			scope_compound(&selector[pos..start], &class, &mut scoped);
		}
		scoped.push_str(&selector[start..end]);
		pos = end;
	}
	if pos < selector.len() {
		scope_compound(&selector[pos..], &class, &mut scoped);
	}
	scoped
}

/// The class goes before the first pseudo-class or pseudo-element, so that it still selects the element itself.
/// Compounds with a nesting selector (`&`) are copied as written.
fn scope_compound(compound: &str, class: &str, scoped: &mut String) {
	if top_level(compound).into_iter().any(|(_, c)| c == '&') {
		scoped.push_str(compound);
		return;
	}
	let insert = top_level(compound).into_iter().find(|&(_, c)| c == ':').map_or(compound.len(), |(i, _)| i);
	scoped.push_str(&compound[..insert]);
	scoped.push_str(class);
	scoped.push_str(&compound[insert..]);
}

/// Characters outside of strings, escapes, `(…)` and `[…]`, with their byte offsets.
fn top_level(text: &str) -> Vec<(usize, char)> {
	let mut result = Vec::new();
	let mut chars = text.char_indices();
	let mut quote = None;
	let mut depth = 0_usize;
	while let Some((i, c)) = chars.next() {
		match (quote, c) {
			(_, '\\') => {
				chars.next();
			}
			(Some(q), c) if c == q => quote = None,
			(Some(_), _) => (),
			(None, '"') | (None, '\'') => quote = Some(c),
			(None, '(') | (None, '[') => depth += 1,
			(None, ')') | (None, ']') => depth = depth.saturating_sub(1),
			(None, c) if depth == 0 => result.push((i, c)),
			(None, _) => (),
		}
	}
	result
}

fn strip_comments(text: &str) -> String {
	let mut stripped = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(start) = rest.find("/*") {
		stripped.push_str(&rest[..start]);
		match rest[start + 2..].find("*/") {
			Some(end) => {
				stripped.push(' ');
				rest = &rest[start + 2 + end + 2..];
			}
			None => {
				rest = "";
			}
		}
	}
	stripped.push_str(rest);
	stripped
}

/// Byte-level cursor. All delimiters are ASCII, so positions always fall on `char` boundaries.
struct Scanner<'a> {
	source: &'a str,
	pos: usize,
}

impl Scanner<'_> {
	fn at_end(&self) -> bool {
		self.pos >= self.source.len()
	}

	fn byte(&self) -> Option<u8> {
		self.source.as_bytes().get(self.pos).copied()
	}

	fn at_comment(&self) -> bool {
		self.source[self.pos..].starts_with("/*")
	}

	fn skip_comment(&mut self) -> Result<(), &'static str> {
		match self.source[self.pos + 2..].find("*/") {
			Some(end) => {
				self.pos += 2 + end + 2;
				Ok(())
			}
			None => Err("unterminated comment"),
		}
	}

	fn skip_string(&mut self) -> Result<(), &'static str> {
		let quote = self.byte();
		self.pos += 1;
		while let Some(byte) = self.byte() {
			match byte {
				b'\\' => self.pos += 2,
				b'\n' => return Err("unterminated string"),
				_ if Some(byte) == quote => {
					self.pos += 1;
					return Ok(());
				}
				_ => self.pos += 1,
			}
		}
		Err("unterminated string")
	}

	fn skip_trivia(&mut self) -> Result<(), &'static str> {
		while let Some(byte) = self.byte() {
			if byte.is_ascii_whitespace() {
				self.pos += 1
			} else if self.at_comment() {
				self.skip_comment()?
			} else {
				break;
			}
		}
		Ok(())
	}

	/// Advances to the next of `stops` outside of comments, strings and parentheses, and returns it without consuming it.
	fn until_top_level(&mut self, stops: &[u8]) -> Result<Option<u8>, &'static str> {
		let mut depth = 0_usize;
		while let Some(byte) = self.byte() {
			match byte {
				b'\\' => self.pos += 2,
				b'"' | b'\'' => self.skip_string()?,
				b'/' if self.at_comment() => self.skip_comment()?,
				b'(' | b'[' => {
					depth += 1;
					self.pos += 1
				}
				b')' | b']' => {
					depth = depth.saturating_sub(1);
					self.pos += 1
				}
				_ if depth == 0 && stops.contains(&byte) => return Ok(Some(byte)),
				_ => self.pos += 1,
			}
		}
		self.pos = self.source.len();
		Ok(None)
	}

	/// Call just past a `{`. Consumes through the matching `}` and returns that brace's position.
	fn block_end(&mut self) -> Result<usize, &'static str> {
		let mut depth = 1_usize;
		while let Some(byte) = self.byte() {
			match byte {
				b'\\' => self.pos += 2,
				b'"' | b'\'' => self.skip_string()?,
				b'/' if self.at_comment() => self.skip_comment()?,
				b'{' => {
					depth += 1;
					self.pos += 1
				}
				b'}' => {
					depth -= 1;
					if depth == 0 {
						let end = self.pos;
						self.pos += 1;
						return Ok(end);
					}
					self.pos += 1
				}
				_ => self.pos += 1,
			}
		}
		Err("unterminated block")
	}
}

#[cfg(test)]
mod tests {
	use super::{scope_selector, ScopingToken};

	#[test]
	fn compounds() {
		let token = ScopingToken::from_raw("t");
		assert_eq!(scope_selector("a:hover", &token), "a.t:hover");
		assert_eq!(scope_selector("p::before", &token), "p.t::before");
		assert_eq!(scope_selector("ul li+li", &token), "ul.t li.t+li.t");
		assert_eq!(scope_selector("a ~ *", &token), "a.t ~ *.t");
		assert_eq!(scope_selector("li:nth-child(2n + 1)", &token), "li.t:nth-child(2n + 1)");
		assert_eq!(scope_selector("[title=\"a b\"]", &token), "[title=\"a b\"].t");
		assert_eq!(scope_selector(".md\\:flex", &token), ".md\\:flex.t");
		assert_eq!(scope_selector("&:hover", &token), "&:hover");
		assert_eq!(scope_selector("> li", &token), "> li.t");
		assert_eq!(scope_selector(".x &", &token), ".x.t &");
	}

	#[test]
	fn tokens() {
		assert_eq!(ScopingToken::new("x-foo", "foo").as_str(), "x-foo_foo");
		assert_eq!(ScopingToken::new("x-foo", "my sheet.v2").as_str(), "x-foo_my_sheet_v2");
		assert_eq!(ScopingToken::from_raw("1x").as_str(), "_1x");
	}
}
