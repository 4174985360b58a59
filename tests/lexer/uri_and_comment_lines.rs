use m3ulex::lexer::{Scanner, TokenKind};

fn collect(input: &str) -> Vec<(TokenKind, String)> {
    let mut scanner = Scanner::from_text(input);
    scanner
        .drain()
        .expect("scan should succeed")
        .into_iter()
        .map(|token| (token.kind, token.value))
        .collect()
}

#[test]
fn empty_input_produces_no_tokens() {
    assert_eq!(collect(""), vec![]);
}

#[test]
fn uri_line_without_trailing_newline_is_emitted() {
    assert_eq!(
        collect("segment-001.ts"),
        vec![(TokenKind::Uri, "segment-001.ts".to_string())]
    );
}

#[test]
fn empty_line_is_an_empty_uri() {
    assert_eq!(collect("\n"), vec![(TokenKind::Uri, String::new())]);
}

#[test]
fn blank_line_between_segments_is_preserved() {
    assert_eq!(
        collect("a.ts\n\nb.ts\n"),
        vec![
            (TokenKind::Uri, "a.ts".to_string()),
            (TokenKind::Uri, String::new()),
            (TokenKind::Uri, "b.ts".to_string()),
        ]
    );
}

#[test]
fn uri_keeps_leading_and_trailing_whitespace() {
    assert_eq!(
        collect("  a.ts \n"),
        vec![(TokenKind::Uri, "  a.ts ".to_string())]
    );
}

#[test]
fn hash_only_line_is_an_empty_comment() {
    assert_eq!(collect("#\n"), vec![(TokenKind::Comment, String::new())]);
}

#[test]
fn comment_preserves_original_case_and_spacing() {
    assert_eq!(
        collect("# Created By Tool \n"),
        vec![(TokenKind::Comment, " Created By Tool ".to_string())]
    );
}

#[test]
fn hash_mid_line_belongs_to_the_uri() {
    assert_eq!(
        collect("a#b.ts\n"),
        vec![(TokenKind::Uri, "a#b.ts".to_string())]
    );
}

#[test]
fn non_ascii_characters_pass_through_uri_lines() {
    assert_eq!(
        collect("média/αβ.ts\n"),
        vec![(TokenKind::Uri, "média/αβ.ts".to_string())]
    );
}

#[test]
fn literal_nul_characters_are_ordinary_uri_content() {
    assert_eq!(
        collect("a\0b\n"),
        vec![(TokenKind::Uri, "a\0b".to_string())]
    );
}
