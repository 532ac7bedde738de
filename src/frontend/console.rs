use crate::error::PrompterError;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Races `fut` against Ctrl-C. In-flight requests are dropped on interrupt.
pub async fn interruptible<T, F>(fut: F) -> Result<T, PrompterError>
where
    F: Future<Output = Result<T, PrompterError>>,
{
    tokio::select! {
        res = fut => res,
        _ = tokio::signal::ctrl_c() => Err(PrompterError::Interrupted),
    }
}

/// Line-oriented prompts over any async reader.
pub struct Console<R> {
    lines: Lines<R>,
}

impl Console<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Console<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { lines: reader.lines() }
    }

    /// Asks a question; blank answers and end of input come back as `None`.
    pub async fn ask(&mut self, question: &str) -> Result<Option<String>, PrompterError> {
        println!("{question}");
        print!("> ");
        std::io::stdout().flush()?;

        let line = interruptible(async { self.lines.next_line().await.map_err(PrompterError::from) }).await?;
        Ok(line
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.trim().is_empty()))
    }

    /// Keeps asking until the answer is an integer in `min..=max`.
    pub async fn ask_number(&mut self, question: &str, min: u8, max: u8) -> Result<u8, PrompterError> {
        loop {
            let Some(answer) = self.ask(&format!("{question} ({min}-{max})")).await? else {
                return Err(PrompterError::Interrupted);
            };
            match answer.trim().parse::<u8>() {
                Ok(n) if (min..=max).contains(&n) => return Ok(n),
                _ => println!("Please enter a whole number from {min} to {max}."),
            }
        }
    }

    pub async fn confirm(&mut self, question: &str) -> Result<bool, PrompterError> {
        let answer = self.ask(&format!("{question} [y/N]")).await?;
        Ok(matches!(
            answer.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }
}
