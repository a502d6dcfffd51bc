use std::fmt;

use exam_core::model::{ParseKeyError, Section, SectionCounts, SlotKey, Subject};

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { counts: SectionCounts, name: String },
    Answer { key: SlotKey, index: usize, value: String },
    Clear { key: SlotKey, index: usize },
    Go(SlotKey),
    Show,
    Progress,
    Time,
    End,
    Resume,
    Reset,
    Recent(Option<usize>),
    Stats,
    Theme,
    Help,
    Quit,
}

#[derive(Debug)]
pub enum CommandError {
    Unknown(String),
    Missing(&'static str),
    InvalidNumber { what: &'static str, raw: String },
    TooMany { what: &'static str, max: u32 },
    Key(ParseKeyError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(cmd) => write!(f, "unknown command: {cmd} (try `help`)"),
            CommandError::Missing(what) => write!(f, "missing {what}"),
            CommandError::InvalidNumber { what, raw } => write!(f, "invalid {what}: {raw}"),
            CommandError::TooMany { what, max } => write!(f, "{what} cannot exceed {max}"),
            CommandError::Key(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<ParseKeyError> for CommandError {
    fn from(err: ParseKeyError) -> Self {
        CommandError::Key(err)
    }
}

pub const HELP: &str = "\
Commands:
  start [<s1> <s2>] <name…>           start a test (default 20 and 10 questions)
  answer <subject> <section> <n> <v…> answer question n (A-D or free text)
  clear <subject> <section> <n>       clear question n
  go <subject> <section>              switch subject/section
  show                                list questions of the current section
  progress | time                     show progress or elapsed time
  end                                 finish and archive the test
  resume                              resume the saved test
  reset                               abandon the test without archiving
  recent [n] | stats                  archived tests and totals
  theme                               toggle light/dark
  help | quit";

/// Parse one input line. Blank lines yield `None`.
///
/// # Errors
///
/// Returns `CommandError` for unknown commands or bad arguments.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "start" => parse_start(&rest)?,
        "answer" | "a" => {
            let (key, index) = parse_slot(&rest)?;
            let value = rest[3..].join(" ");
            Command::Answer { key, index, value }
        }
        "clear" => {
            let (key, index) = parse_slot(&rest)?;
            Command::Clear { key, index }
        }
        "go" => Command::Go(parse_key(&rest)?),
        "show" => Command::Show,
        "progress" => Command::Progress,
        "time" => Command::Time,
        "end" => Command::End,
        "resume" => Command::Resume,
        "reset" => Command::Reset,
        "recent" => Command::Recent(
            rest.first()
                .map(|raw| parse_number::<usize>("limit", raw))
                .transpose()?,
        ),
        "stats" => Command::Stats,
        "theme" => Command::Theme,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(Some(command))
}

fn parse_start(rest: &[&str]) -> Result<Command, CommandError> {
    let (counts, name_words) = match rest {
        [s1, s2, name @ ..] if looks_like_count(s1) && looks_like_count(s2) => {
            let s1 = parse_count("section1 count", s1)?;
            let s2 = parse_count("section2 count", s2)?;
            (SectionCounts::clamped(s1, s2), name)
        }
        name => (SectionCounts::default(), name),
    };
    let name = name_words.join(" ");
    if name.is_empty() {
        return Err(CommandError::Missing("test name"));
    }
    Ok(Command::Start { counts, name })
}

/// An optionally negative run of digits, however large.
fn looks_like_count(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Negative counts become zero; counts above the section limit are refused.
fn parse_count(what: &'static str, raw: &str) -> Result<i64, CommandError> {
    let max = SectionCounts::MAX_PER_SECTION;
    if raw.starts_with('-') {
        return Ok(parse_number::<i64>(what, raw).unwrap_or(0));
    }
    match raw.parse::<u32>() {
        Ok(count) if count <= max => Ok(i64::from(count)),
        _ => Err(CommandError::TooMany { what, max }),
    }
}

fn parse_key(rest: &[&str]) -> Result<SlotKey, CommandError> {
    let subject: Subject = rest.first().ok_or(CommandError::Missing("subject"))?.parse()?;
    let section: Section = rest.get(1).ok_or(CommandError::Missing("section"))?.parse()?;
    Ok(SlotKey::new(subject, section))
}

fn parse_slot(rest: &[&str]) -> Result<(SlotKey, usize), CommandError> {
    let key = parse_key(rest)?;
    let raw = rest.get(2).ok_or(CommandError::Missing("question number"))?;
    let number = parse_number::<usize>("question number", raw)?;
    // Questions are numbered from 1 on screen.
    let index = number
        .checked_sub(1)
        .ok_or_else(|| CommandError::InvalidNumber {
            what: "question number",
            raw: (*raw).to_owned(),
        })?;
    Ok((key, index))
}

fn parse_number<T: std::str::FromStr>(what: &'static str, raw: &str) -> Result<T, CommandError> {
    raw.parse().map_err(|_| CommandError::InvalidNumber {
        what,
        raw: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_nothing() {
        assert!(parse("   ").unwrap().is_none());
    }

    #[test]
    fn start_with_counts_and_multi_word_name() {
        let cmd = parse("start 2 1 Mock A").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Start {
                counts: SectionCounts::new(2, 1),
                name: "Mock A".into()
            }
        );
    }

    #[test]
    fn start_without_counts_uses_defaults() {
        let cmd = parse("start Weekly mock").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Start {
                counts: SectionCounts::default(),
                name: "Weekly mock".into()
            }
        );
    }

    #[test]
    fn start_clamps_negative_counts() {
        let cmd = parse("start -4 3 T").unwrap().unwrap();
        assert!(matches!(
            cmd,
            Command::Start { counts, .. } if counts == SectionCounts::new(0, 3)
        ));
    }

    #[test]
    fn start_name_may_begin_with_a_number() {
        let cmd = parse("start 5 Mock").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Start {
                counts: SectionCounts::default(),
                name: "5 Mock".into()
            }
        );
    }

    #[test]
    fn start_refuses_counts_over_the_limit() {
        for line in ["start 4000000000 1 T", "start 1 99999999999999999999 T"] {
            assert!(
                matches!(parse(line), Err(CommandError::TooMany { .. })),
                "{line}"
            );
        }
        let at_limit = format!("start {} 0 T", SectionCounts::MAX_PER_SECTION);
        assert!(parse(&at_limit).is_ok());
    }

    #[test]
    fn start_needs_a_name() {
        assert!(matches!(
            parse("start 5 5"),
            Err(CommandError::Missing("test name"))
        ));
    }

    #[test]
    fn answer_is_one_based_and_keeps_spaces() {
        let cmd = parse("answer chemistry section2 3 12 mol L").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Answer {
                key: SlotKey::new(Subject::Chemistry, Section::Section2),
                index: 2,
                value: "12 mol L".into()
            }
        );
    }

    #[test]
    fn answer_without_value_clears() {
        let cmd = parse("a physics 1 1").unwrap().unwrap();
        assert!(matches!(cmd, Command::Answer { value, .. } if value.is_empty()));
    }

    #[test]
    fn question_zero_is_rejected() {
        assert!(matches!(
            parse("clear physics section1 0"),
            Err(CommandError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn unknown_subject_is_reported() {
        let err = parse("go biology section1").unwrap_err();
        assert_eq!(err.to_string(), "unknown subject: biology");
    }

    #[test]
    fn unknown_command_is_reported() {
        assert!(matches!(parse("dance"), Err(CommandError::Unknown(_))));
    }

    #[test]
    fn recent_limit_is_optional() {
        assert_eq!(parse("recent").unwrap(), Some(Command::Recent(None)));
        assert_eq!(parse("recent 3").unwrap(), Some(Command::Recent(Some(3))));
    }
}
