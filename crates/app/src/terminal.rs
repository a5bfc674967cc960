//! Line-oriented quiz and stats views for the `drill` binary.

use std::io::Write;

use anyhow::{Context, bail};
use drill_core::model::{AchievementProgress, ProblemStat, QuizSummary};
use services::{QuizLoopService, QuizSession};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

fn format_ms(ms: Option<u64>) -> String {
    ms.map_or_else(|| "-".to_string(), |ms| format!("{:.2}s", ms as f64 / 1_000.0))
}

async fn read_line<R: AsyncBufRead + Unpin>(input: &mut R) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    let n = input.read_line(&mut line).await.context("reading input")?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

async fn ask_question_count<R, W>(
    session: &QuizSession,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Option<u32>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let choices = session.settings().question_choices();
    loop {
        write!(out, "How many questions? {choices:?}: ")?;
        out.flush()?;
        let Some(line) = read_line(input).await? else {
            return Ok(None);
        };
        match line.trim().parse::<u32>() {
            Ok(n) if session.settings().allows(n) => return Ok(Some(n)),
            _ => writeln!(out, "Please pick one of {choices:?}.")?,
        }
    }
}

/// Run one quiz against `input`, writing prompts and feedback to `out`.
///
/// End of input abandons the quiz; answers already given stay recorded.
///
/// # Errors
///
/// Returns an error for an invalid question count or an I/O failure.
pub async fn run_quiz<R, W>(
    quiz: &QuizLoopService,
    session: &mut QuizSession,
    questions: Option<u32>,
    mut input: R,
    out: &mut W,
) -> anyhow::Result<Option<QuizSummary>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let total = match questions {
        Some(n) => n,
        None => match ask_question_count(session, &mut input, out).await? {
            Some(n) => n,
            None => return Ok(None),
        },
    };
    session.start(total)?;

    while !session.is_complete() {
        let Some(problem) = session.current_problem() else {
            bail!("quiz is running without a problem on screen");
        };
        let progress = session.progress();
        write!(
            out,
            "[{}/{}] {} x {} = ",
            progress.answered + 1,
            progress.total,
            problem.lhs(),
            problem.rhs()
        )?;
        out.flush()?;

        let Some(line) = read_line(&mut input).await? else {
            writeln!(out)?;
            writeln!(out, "Quiz abandoned.")?;
            session.reset();
            return Ok(None);
        };

        let result = quiz.submit_answer(session, &line).await?;
        let answered = &result.outcome.answered;
        let secs = format_ms(Some(answered.elapsed_ms));
        if answered.correct {
            write!(out, "Correct! ({secs})")?;
        } else {
            write!(
                out,
                "Wrong: {} x {} = {} ({secs})",
                problem.lhs(),
                problem.rhs(),
                problem.answer()
            )?;
        }
        match &result.saved {
            Ok(attempt) if attempt.new_best => write!(out, "  New best time!")?,
            Ok(_) => {}
            Err(err) => write!(out, "  (time not saved: {err})")?,
        }
        writeln!(out)?;
    }

    let summary = session
        .summary()
        .cloned()
        .context("completed quiz has no summary")?;
    print_summary(&summary, out)?;
    Ok(Some(summary))
}

/// # Errors
///
/// Returns an error if writing fails.
pub fn print_summary<W: Write>(summary: &QuizSummary, out: &mut W) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Score: {}/{}  Accuracy: {:.0}%",
        summary.correct(),
        summary.total_questions(),
        summary.accuracy_percent()
    )?;
    writeln!(
        out,
        "Total time: {}  Average: {:.2}s per question",
        format_ms(Some(summary.total_time_ms())),
        summary.average_time_ms() / 1_000.0
    )
}

/// Print stats as a table followed by the achievement line.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn print_stats<W: Write>(
    rows: &[ProblemStat],
    achievement: Option<&AchievementProgress>,
    out: &mut W,
) -> std::io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No problems answered yet.");
    }

    writeln!(
        out,
        "{:<9} {:>9} {:>9} {:>9} {:>10} {:>9}",
        "Problem", "Best", "Previous", "Attempts", "Incorrect", "Accuracy"
    )?;
    for row in rows {
        writeln!(
            out,
            "{:<9} {:>9} {:>9} {:>9} {:>10} {:>8.0}%",
            row.key.to_string(),
            format_ms(row.record.best_time_ms()),
            format_ms(row.record.previous_best_time_ms()),
            row.record.attempts(),
            row.record.incorrect_attempts(),
            row.record.accuracy() * 100.0
        )?;
    }

    if let Some(progress) = achievement {
        writeln!(out)?;
        write!(
            out,
            "Level: {} ({}), average best {}",
            progress.level.title(),
            progress.level.description(),
            format_ms(Some(progress.average_best_time_ms.round() as u64))
        )?;
        if let Some(next) = progress.next_level {
            write!(
                out,
                ", next: {} at {}",
                next.title(),
                format_ms(Some(next.max_time_ms()))
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}
