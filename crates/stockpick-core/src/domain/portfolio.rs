use serde::Serialize;

use crate::{PortfolioError, Ticker, ValidationError};

/// An ordered, deduplicated set of tickers sourced from one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Portfolio {
    name: String,
    tickers: Vec<Ticker>,
}

/// A line the parser skipped, kept for user-facing warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: usize,
    pub content: String,
    pub reason: ValidationError,
}

/// Result of parsing a portfolio file: the portfolio plus every skipped line.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioParse {
    pub portfolio: Portfolio,
    pub skipped: Vec<SkippedLine>,
}

impl Portfolio {
    /// Parse portfolio file content: one ticker per line, blank lines
    /// ignored, only the first whitespace-separated token of a line is
    /// considered. Duplicates keep their first occurrence; invalid lines
    /// are skipped and reported. Fails when the file is empty or no line
    /// yields a valid ticker.
    pub fn parse(name: impl Into<String>, content: &str) -> Result<PortfolioParse, PortfolioError> {
        let mut tickers: Vec<Ticker> = Vec::new();
        let mut skipped = Vec::new();
        let mut saw_any_line = false;

        for (index, line) in content.lines().enumerate() {
            let Some(token) = line.split_whitespace().next() else {
                continue;
            };
            saw_any_line = true;

            match Ticker::parse(token) {
                Ok(ticker) => {
                    if !tickers.contains(&ticker) {
                        tickers.push(ticker);
                    }
                }
                Err(reason) => skipped.push(SkippedLine {
                    line: index + 1,
                    content: token.to_owned(),
                    reason,
                }),
            }
        }

        if !saw_any_line {
            return Err(PortfolioError::EmptyFile);
        }
        if tickers.is_empty() {
            return Err(PortfolioError::NoValidTickers {
                skipped: skipped.len(),
            });
        }

        Ok(PortfolioParse {
            portfolio: Self {
                name: name.into(),
                tickers,
            },
            skipped,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_preserving_first_occurrence_order() {
        let parse = Portfolio::parse("big_tech", "AAPL\nMSFT\nAAPL\n").expect("must parse");
        let symbols: Vec<&str> = parse
            .portfolio
            .tickers()
            .iter()
            .map(Ticker::as_str)
            .collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        assert!(parse.skipped.is_empty());
    }

    #[test]
    fn ignores_blank_lines_and_trailing_annotations() {
        let parse =
            Portfolio::parse("mixed", "\n  aapl  core holding\n\nmsft\n").expect("must parse");
        let symbols: Vec<&str> = parse
            .portfolio
            .tickers()
            .iter()
            .map(Ticker::as_str)
            .collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn skips_invalid_lines_with_reasons() {
        let parse = Portfolio::parse("noisy", "AAPL\n123BAD\nMSFT\n").expect("must parse");
        assert_eq!(parse.portfolio.len(), 2);
        assert_eq!(parse.skipped.len(), 1);
        assert_eq!(parse.skipped[0].line, 2);
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(matches!(
            Portfolio::parse("empty", "\n\n  \n"),
            Err(PortfolioError::EmptyFile)
        ));
    }

    #[test]
    fn all_invalid_lines_is_an_error() {
        assert!(matches!(
            Portfolio::parse("junk", "123\n$$$\n"),
            Err(PortfolioError::NoValidTickers { skipped: 2 })
        ));
    }
}
