use m3ulex::lexer::{Scanner, ScannerOptions, Token};
use m3ulex::source::TextSource;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

const MAX_INPUT_BYTES: usize = 512;

fn grammar_heavy_input() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop::sample::select(vec![
            'a', 'A', 'Z', '0', 'E', 'X', 'T', '#', ':', '=', ',', '"', '-', ' ', '\r', '\n',
            '\0', 'é',
        ]),
        0..=MAX_INPUT_BYTES,
    )
    .prop_map(|chars| chars.into_iter().collect::<String>())
}

/// Well-formed playlist lines, so the structured paths get coverage too.
fn playlist_input() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        "[a-z0-9./-]{0,24}",
        "#[ a-z0-9]{0,16}",
        "#EXT[A-Z0-9-]{0,12}",
        "#EXT[A-Z0-9-]{1,8}:[a-z0-9 .,]{0,16}",
        "#EXT[A-Z0-9-]{1,8}:[A-Z0-9-]{1,8}=[a-z0-9.]{0,8}(,[A-Z0-9-]{1,8}=\"[a-z0-9. ]{0,8}\")?",
    ];
    proptest::collection::vec((line, prop_oneof![Just("\n"), Just("\r\n")]), 0..24).prop_map(
        |lines| {
            lines
                .into_iter()
                .map(|(text, terminator)| format!("{text}{terminator}"))
                .collect()
        },
    )
}

fn drain_verbose(input: &str) -> Vec<Token> {
    let mut scanner = Scanner::with_options(
        TextSource::new(input),
        ScannerOptions { verbose: true },
    );
    scanner.drain().expect("in-memory scan cannot fail")
}

fn drain_quiet(input: &str) -> Vec<Token> {
    let mut scanner = Scanner::from_text(input);
    scanner.drain().expect("in-memory scan cannot fail")
}

/// Checks that each token's recorded position addresses exactly the
/// first character of its value in the original input.
fn assert_position_law(input: &str, tokens: &[Token]) -> Result<(), TestCaseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut line_starts = vec![0usize];
    for (index, ch) in chars.iter().enumerate() {
        if *ch == '\n' {
            line_starts.push(index + 1);
        }
    }
    for token in tokens {
        prop_assert!(token.line >= 1 && token.line <= line_starts.len());
        let start = line_starts[token.line - 1] + token.column - 1;
        let value: Vec<char> = token.value.chars().collect();
        prop_assert!(
            start + value.len() <= chars.len(),
            "token {:?} at {}:{} overruns the input",
            token.kind,
            token.line,
            token.column
        );
        prop_assert_eq!(
            &chars[start..start + value.len()],
            value.as_slice(),
            "token {:?} at {}:{} does not re-scan to its value",
            token.kind,
            token.line,
            token.column
        );
    }
    Ok(())
}

fn assert_all_laws(input: &str) -> Result<(), TestCaseError> {
    let verbose = drain_verbose(input);
    let quiet = drain_quiet(input);

    // Concatenation: verbose token values rebuild the input exactly.
    let rebuilt: String = verbose.iter().map(|token| token.value.as_str()).collect();
    prop_assert_eq!(rebuilt, input);

    // Filtering idempotence: quiet mode equals the substantive
    // subsequence of verbose mode, positions included.
    let filtered: Vec<Token> = verbose
        .iter()
        .filter(|token| !token.kind.is_structural())
        .cloned()
        .collect();
    prop_assert_eq!(&filtered, &quiet);

    // Position: every token re-scans to its own first character.
    assert_position_law(input, &verbose)?;

    // Monotonicity: positions never move backwards.
    for pair in verbose.windows(2) {
        prop_assert!(
            (pair[0].line, pair[0].column) <= (pair[1].line, pair[1].column),
            "positions regressed between {:?} and {:?}",
            pair[0],
            pair[1]
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn laws_hold_on_grammar_heavy_inputs(input in grammar_heavy_input()) {
        assert_all_laws(&input)?;
    }

    #[test]
    fn laws_hold_on_well_formed_playlists(input in playlist_input()) {
        assert_all_laws(&input)?;
    }

    #[test]
    fn line_count_matches_consumed_line_feeds(input in grammar_heavy_input()) {
        let line_feeds = input.chars().filter(|ch| *ch == '\n').count();
        let mut scanner = Scanner::from_text(input);
        scanner.drain().expect("in-memory scan cannot fail");
        prop_assert_eq!(scanner.line(), line_feeds + 1);
    }
}
