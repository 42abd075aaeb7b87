//! Shell-word splitting of host CLI command lines
//!
//! Words are separated by whitespace. Single quotes keep everything literal,
//! double quotes allow `\"`, `\\`, `\$` and `` \` `` escapes, and a backslash
//! outside quotes escapes the next character. Adjacent pieces join into one
//! word, so `--name='a b'` is a single argument.

use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::{any, take_till, take_while};

/// Split `input` into argv words
pub fn split_command(input: &str) -> Result<Vec<String>, String> {
    words.parse(input).map_err(|e| {
        format!(
            "malformed command at offset {}: unterminated quote or escape",
            e.offset()
        )
    })
}

fn words(input: &mut &str) -> ModalResult<Vec<String>> {
    let _ = multispace0.parse_next(input)?;
    repeat(0.., terminated(word, multispace0)).parse_next(input)
}

fn word(input: &mut &str) -> ModalResult<String> {
    repeat(1.., alt((bare, single_quoted, double_quoted, escaped)))
        .fold(String::new, |mut acc, part: String| {
            acc.push_str(&part);
            acc
        })
        .parse_next(input)
}

fn bare(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| {
        !c.is_whitespace() && !matches!(c, '\'' | '"' | '\\')
    })
    .map(str::to_string)
    .parse_next(input)
}

fn single_quoted(input: &mut &str) -> ModalResult<String> {
    preceded('\'', cut_err(terminated(take_till(0.., '\''), '\'')))
        .map(str::to_string)
        .parse_next(input)
}

fn double_quoted(input: &mut &str) -> ModalResult<String> {
    let inner = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c != '"' && c != '\\').map(str::to_string),
            preceded('\\', any).map(|c: char| match c {
                '"' | '\\' | '$' | '`' => c.to_string(),
                other => format!("\\{other}"),
            }),
        )),
    )
    .fold(String::new, |mut acc, part: String| {
        acc.push_str(&part);
        acc
    });

    preceded('"', cut_err(terminated(inner, '"'))).parse_next(input)
}

fn escaped(input: &mut &str) -> ModalResult<String> {
    preceded('\\', cut_err(any))
        .map(|c: char| c.to_string())
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(input: &str) -> Vec<String> {
        split_command(input).unwrap()
    }

    #[test]
    fn test_plain_words() {
        assert_eq!(split("user:list"), vec!["user:list"]);
        assert_eq!(
            split("  config:app:set   files  max_chunk_size --value 0 "),
            vec!["config:app:set", "files", "max_chunk_size", "--value", "0"]
        );
        assert!(split("").is_empty());
        assert!(split("   ").is_empty());
    }

    #[test]
    fn test_quotes() {
        assert_eq!(
            split(r#"user:add --display-name "Brand New User" brand-new"#),
            vec!["user:add", "--display-name", "Brand New User", "brand-new"]
        );
        assert_eq!(split("echo 'a \"b\" c'"), vec!["echo", "a \"b\" c"]);
        assert_eq!(split("--name='a b'"), vec!["--name=a b"]);
        assert_eq!(split("''"), vec![""]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(split(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(split(r#""keep \n""#), vec![r"keep \n"]);
        assert_eq!(split(r"a\ b c"), vec!["a b", "c"]);
        assert_eq!(split(r"'no\escape'"), vec![r"no\escape"]);
    }

    #[test]
    fn test_unterminated_input_is_rejected() {
        assert!(split_command("user:add 'alice").is_err());
        assert!(split_command("user:add \"alice").is_err());
        assert!(split_command("trailing\\").is_err());
    }
}
