//! Terminal-backed [`Operator`]: prints each prompt and reads one line back.

use colored::Colorize;
use std::io::{BufRead, Write};

use navgraph_resolver::{Answer, Operator, Prompt};

/// Interpret `input` as the reply to `prompt`.
///
/// Choices accept either the 1-based number shown next to a candidate or
/// its exact name; levels may also be typed as the level itself. `b` steps
/// back, `c` cancels. Anything unrecognised is passed through as a name so
/// the workflow can reject it.
pub fn parse_answer(prompt: &Prompt, input: &str) -> Answer {
    let input = input.trim();
    match input.to_ascii_lowercase().as_str() {
        "b" | "back" => return Answer::Back,
        "c" | "cancel" => return Answer::Cancel,
        _ => {}
    }

    match prompt {
        Prompt::Confirm { .. } => match input.to_ascii_lowercase().as_str() {
            "y" | "yes" => Answer::Confirm,
            _ => Answer::Decline,
        },
        Prompt::ChooseLevel { candidates } => {
            if input.is_empty() {
                return Answer::Decline;
            }
            match input.parse::<i32>() {
                Ok(level) if candidates.contains(&level) => Answer::Level(level),
                Ok(n) => pick(candidates, n).map_or(Answer::Level(n), |&l| Answer::Level(l)),
                Err(_) => Answer::Hallway(input.to_string()),
            }
        }
        Prompt::ChooseHallway { candidates, .. } => {
            if input.is_empty() {
                return Answer::Decline;
            }
            Answer::Hallway(by_number_or_name(candidates, input))
        }
        Prompt::ChooseEntrypoint { candidates, .. } => {
            if input.is_empty() {
                return Answer::Decline;
            }
            Answer::Entrypoint(by_number_or_name(candidates, input))
        }
    }
}

fn pick<T>(candidates: &[T], n: i32) -> Option<&T> {
    usize::try_from(n).ok()?.checked_sub(1).and_then(|i| candidates.get(i))
}

fn by_number_or_name(candidates: &[String], input: &str) -> String {
    input
        .parse::<i32>()
        .ok()
        .and_then(|n| pick(candidates, n))
        .cloned()
        .unwrap_or_else(|| input.to_string())
}

/// Reads answers from `input`, echoes prompts to `output`. End of input
/// cancels.
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn show(&mut self, prompt: &Prompt) -> std::io::Result<()> {
        writeln!(self.output, "  {}", prompt.to_string().bold())?;
        for (i, label) in prompt.candidate_labels().iter().enumerate() {
            writeln!(self.output, "    {} {}", format!("{})", i + 1).cyan(), label)?;
        }
        let hint = match prompt {
            Prompt::Confirm { .. } => "[y/N, c=cancel]",
            Prompt::ChooseEntrypoint { candidates, .. } if candidates.is_empty() => {
                "nothing eligible here [b=back, c=cancel]"
            }
            _ => "[number or name, b=back, c=cancel]",
        };
        write!(self.output, "  {} ", hint.dimmed())?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn answer(&mut self, prompt: &Prompt) -> Answer {
        if let Err(e) = self.show(prompt) {
            tracing::warn!(error = %e, "could not write prompt");
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => Answer::Cancel,
            Ok(_) => parse_answer(prompt, &line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navgraph_types::EntryKind;
    use std::io::Cursor;

    fn confirm() -> Prompt {
        Prompt::Confirm {
            entrypoint: "Door".into(),
            kind: EntryKind::Door,
            hallway: "Lobby".into(),
            more: false,
        }
    }

    #[test]
    fn confirm_defaults_to_decline() {
        assert_eq!(parse_answer(&confirm(), "y"), Answer::Confirm);
        assert_eq!(parse_answer(&confirm(), "YES\n"), Answer::Confirm);
        assert_eq!(parse_answer(&confirm(), ""), Answer::Decline);
        assert_eq!(parse_answer(&confirm(), "c"), Answer::Cancel);
    }

    #[test]
    fn levels_by_value_or_position() {
        let p = Prompt::ChooseLevel {
            candidates: vec![-1, 0, 4],
        };
        assert_eq!(parse_answer(&p, "4"), Answer::Level(4));
        assert_eq!(parse_answer(&p, "2"), Answer::Level(0));
        assert_eq!(parse_answer(&p, "9"), Answer::Level(9));
        assert_eq!(parse_answer(&p, "b"), Answer::Back);
    }

    #[test]
    fn names_by_position_or_text() {
        let p = Prompt::ChooseHallway {
            level: 0,
            candidates: vec!["Atrium".into(), "Wing".into()],
        };
        assert_eq!(parse_answer(&p, "2"), Answer::Hallway("Wing".into()));
        assert_eq!(parse_answer(&p, "Atrium"), Answer::Hallway("Atrium".into()));
        assert_eq!(parse_answer(&p, "7"), Answer::Hallway("7".into()));
        assert_eq!(parse_answer(&p, ""), Answer::Decline);
    }

    #[test]
    fn console_reads_lines_and_cancels_at_eof() {
        let p = Prompt::ChooseEntrypoint {
            hallway: "Lobby".into(),
            candidates: vec!["Front".into()],
        };
        let mut out = Vec::new();
        let mut op = ConsoleOperator::new(Cursor::new("1\n"), &mut out);
        assert_eq!(op.answer(&p), Answer::Entrypoint("Front".into()));
        assert_eq!(op.answer(&p), Answer::Cancel);
        drop(op);
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("Choose an entrypoint on Lobby"));
        assert!(shown.contains("Front"));
    }
}
