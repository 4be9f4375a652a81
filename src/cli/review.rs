//! Interactive duplicate review
//!
//! Bridges the engine's review queue to the terminal: each staged pair is
//! shown with its dimensions and the operator picks a disposition. Closing
//! the prompt aborts the review and cancels the scan.

use anyhow::{Context, Result, bail};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};

use crate::engine::{Disposition, ImageFacts, ReviewHandler, ReviewRequest};

use super::output::Output;

pub struct ConsoleReviewer<'a> {
    output: &'a Output,
    theme: ColorfulTheme,
}

impl<'a> ConsoleReviewer<'a> {
    pub fn new(output: &'a Output) -> Self {
        Self {
            output,
            theme: ColorfulTheme::default(),
        }
    }
}

fn describe(facts: &ImageFacts) -> String {
    match facts.dimensions {
        Some((width, height)) => format!("{} ({width}x{height})", facts.path.display()),
        None => format!("{} (unreadable)", facts.path.display()),
    }
}

impl ReviewHandler for ConsoleReviewer<'_> {
    fn decide(&mut self, request: &ReviewRequest) -> Result<Disposition> {
        self.output.header("Possible duplicate");
        self.output.table_row("left", &describe(&request.left));
        self.output.table_row("right", &describe(&request.right));

        let choice = Select::with_theme(&self.theme)
            .with_prompt("Which file should survive?")
            .items(&["Keep left", "Keep right", "Keep both", "Delete both"])
            .default(2)
            .interact_opt()
            .context("review prompt failed")?;

        match choice {
            Some(0) => Ok(Disposition::KeepLeft),
            Some(1) => Ok(Disposition::KeepRight),
            Some(2) => Ok(Disposition::KeepBoth),
            Some(_) => {
                let confirmed = Confirm::with_theme(&self.theme)
                    .with_prompt("Really delete both files?")
                    .default(false)
                    .interact_opt()
                    .context("confirmation prompt failed")?;
                match confirmed {
                    Some(value) => Ok(Disposition::DeleteBoth { confirmed: value }),
                    None => bail!("review aborted"),
                }
            }
            None => bail!("review aborted"),
        }
    }
}
