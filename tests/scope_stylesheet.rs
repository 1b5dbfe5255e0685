use hydrate_dom::{
	scope::{compile_stylesheet, compile_stylesheets, is_scoped_stylesheet, scope_stylesheet, ScopingToken},
	ScopingError, ScopingErrorKind,
};
use std::{fs, path::PathBuf};

fn scope(css: &str) -> Result<String, ScopingError> {
	scope_stylesheet("foo.scoped.css", css, &ScopingToken::new("x-foo", "foo")).map(|scoped| scoped.css().to_owned())
}

fn error_kind(css: &str) -> ScopingErrorKind {
	scope(css).unwrap_err().kind
}

#[test]
fn every_compound() {
	assert_eq!(scope("div > .bar {}").unwrap(), "div.x-foo_foo > .bar.x-foo_foo {}");
	assert_eq!(scope("ul  li + li ~ a {color:red}").unwrap(), "ul.x-foo_foo  li.x-foo_foo + li.x-foo_foo ~ a.x-foo_foo {color:red}");
	assert_eq!(scope("a:hover, p::first-line { x: y }").unwrap(), "a.x-foo_foo:hover, p.x-foo_foo::first-line { x: y }");
	assert_eq!(scope("input[type=\"a > b\"]:not(.c d) {}").unwrap(), "input[type=\"a > b\"].x-foo_foo:not(.c d) {}");
}

#[test]
fn rules_and_at_rules() {
	let css = "
		/* header */
		@charset \"utf-8\";
		.a { b: c; }
		@media (min-width: 10px) {
			.d .e { f: g; }
			@supports (display: grid) { h { i: j } }
		}
		@keyframes spin { from { k: l } to { k: m } }
		@font-face { font-family: x; }
	";
	assert_eq!(
		scope(css).unwrap(),
		[
			"@charset \"utf-8\";",
			".a.x-foo_foo { b: c; }",
			"@media (min-width: 10px) {",
			".d.x-foo_foo .e.x-foo_foo { f: g; }",
			"@supports (display: grid) {",
			"h.x-foo_foo { i: j }",
			"}",
			"}",
			"@keyframes spin { from { k: l } to { k: m } }",
			"@font-face { font-family: x; }",
		]
		.join("\n")
	);
}

#[test]
fn strings_and_comments_in_blocks() {
	assert_eq!(scope("a { content: \"}\"; /* } */ }").unwrap(), "a.x-foo_foo { content: \"}\"; /* } */ }");
	assert_eq!(scope("a /* x */ > b {}").unwrap(), "a.x-foo_foo   > b.x-foo_foo {}");
}

#[test]
fn nested_rules() {
	assert_eq!(
		scope("div { color: red; & > span { color: blue } }").unwrap(),
		"div.x-foo_foo { color: red; & > span.x-foo_foo { color: blue } }"
	);
	assert_eq!(scope("a { &:hover { b: c } .x & { d: e } }").unwrap(), "a.x-foo_foo { &:hover { b: c } .x.x-foo_foo & { d: e } }");
	assert_eq!(scope("ul { li { a { b: c } } }").unwrap(), "ul.x-foo_foo { li.x-foo_foo { a.x-foo_foo { b: c } } }");
	assert_eq!(
		scope("p { @media print { color: red; span { x: y } } }").unwrap(),
		"p.x-foo_foo { @media print { color: red; span.x-foo_foo { x: y } } }"
	);
	assert_eq!(scope("p { --shape: { a: b }; c: d }").unwrap(), "p.x-foo_foo { --shape: { a: b }; c: d }");
}

#[test]
fn root_context_selectors() {
	for (css, pseudo) in &[
		(":host { display: block }", ":host"),
		(":host(.active) a {}", ":host"),
		(":host-context(.dark) p {}", ":host-context"),
		(":root { --x: 1 }", ":root"),
		("a, :ROOT b {}", ":root"),
		("p:not(:root) {}", ":root"),
		("@media print { :host {} }", ":host"),
		("div { :host & { color: red } }", ":host"),
		("div { @media print { p :root {} } }", ":root"),
	] {
		assert_eq!(error_kind(css), ScopingErrorKind::RootContextSelector((*pseudo).to_owned()), "{}", css);
	}
	assert!(scope("a[title=\":root\"] {}").is_ok());
	assert!(scope("a::hostile {}").is_ok());
}

#[test]
fn import() {
	assert_eq!(error_kind("@import url(a.css);\na {}"), ScopingErrorKind::Import);
	assert_eq!(error_kind("@media print { @import 'b.css'; }"), ScopingErrorKind::Import);
	assert_eq!(error_kind("a { @import 'c.css'; }"), ScopingErrorKind::Import);
}

#[test]
fn error_details() {
	let error = scope("a {}\n:host > b {}").unwrap_err();
	assert_eq!(error.file, PathBuf::from("foo.scoped.css"));
	assert_eq!(error.selector, ":host > b");
	assert_eq!(error.to_string(), "foo.scoped.css: `:host` is not allowed in a scoped stylesheet (in `:host > b`)");
}

#[test]
fn syntax_errors() {
	for css in &["a { b: c;", "/* open", "a { content: \"x }", "}", "a, {}", "a;"] {
		assert!(matches!(error_kind(css), ScopingErrorKind::Syntax(_)), "{}", css);
	}
}

#[test]
fn naming_convention() {
	assert!(is_scoped_stylesheet("src/foo.scoped.css"));
	assert!(!is_scoped_stylesheet("src/foo.css"));
	assert!(!is_scoped_stylesheet(".scoped.css"));
}

#[test]
fn compile_files() {
	let dir = std::env::temp_dir().join(format!("hydrate-dom-scope-{}", std::process::id()));
	fs::create_dir_all(&dir).unwrap();
	let scoped = dir.join("card.scoped.css");
	let plain = dir.join("global.css");
	let broken = dir.join("broken.scoped.css");
	let missing = dir.join("missing.scoped.css");
	fs::write(&scoped, "h2 { margin: 0 }").unwrap();
	fs::write(&plain, ":root { --x: 1 }").unwrap();
	fs::write(&broken, "@import 'x.css';").unwrap();

	let stylesheet = compile_stylesheet(&scoped, "x-card").unwrap().unwrap();
	assert_eq!(stylesheet.token().as_str(), "x-card_card");
	assert_eq!(stylesheet.css(), "h2.x-card_card { margin: 0 }");
	assert_eq!(stylesheet.source_path(), scoped.as_path());
	assert_eq!(compile_stylesheet(&plain, "x-card").unwrap(), None);

	let results = compile_stylesheets("x-card", &[&broken, &scoped, &missing]);
	assert_eq!(results[0].as_ref().unwrap_err().kind, ScopingErrorKind::Import);
	assert!(results[1].is_ok());
	assert!(matches!(results[2].as_ref().unwrap_err().kind, ScopingErrorKind::Io(_)));

	fs::remove_dir_all(&dir).unwrap();
}
