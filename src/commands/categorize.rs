use crate::api::{self, Mode};
use crate::commands::Out;
use crate::model::MappingEntry;
use crate::resolve::Categorizer;
use crate::{Config, Result};
use anyhow::Context;

/// Asks for the category of every recent row whose category is missing and records the answers
/// in the mapping sheet. Returns once every question has been answered, or straight away when
/// nothing is missing.
///
/// # Errors
/// - A required setting for `mode` is missing.
/// - Any call to the spreadsheet, Telegram or the webhook fails. There are no retries.
pub async fn categorize(config: Config, mode: Mode) -> Result<Out<Vec<MappingEntry>>> {
    let sheet = api::sheet(&config, mode)
        .await
        .context("Unable to open the spreadsheet")?;
    let notifier = api::notifier(&config, mode)?;
    let chat = api::chat(&config, mode)
        .await
        .context("Unable to start the chat bot")?;

    let layout = config.layout().clone();
    let mapping_sheet = layout.mapping_sheet.clone();
    let recorded = Categorizer::new(sheet, chat, notifier, layout)
        .run()
        .await?;

    let message = match recorded.len() {
        0 => "No rows are missing a category".to_string(),
        1 => format!("Recorded 1 category in the '{mapping_sheet}' sheet"),
        n => format!("Recorded {n} categories in the '{mapping_sheet}' sheet"),
    };
    Ok(Out::new(message, recorded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use clap::Parser;

    #[tokio::test]
    async fn test_categorize_without_credentials() {
        let dir = tempfile::TempDir::new().unwrap();
        let home = dir.path().to_string_lossy().to_string();
        let args = Args::try_parse_from([
            "categorize",
            "--home",
            &home,
            "--sheet-url",
            "https://docs.google.com/spreadsheets/d/ABC123/edit",
        ])
        .unwrap();
        let config = Config::new(&args).unwrap();

        // No credential files exist in the temporary home.
        let error = categorize(config, Mode::Google).await.unwrap_err();
        assert!(format!("{error:?}").contains("Unable to open the spreadsheet"));
    }

    #[test]
    fn test_out_message() {
        let out: Out<Vec<MappingEntry>> = Out::new(
            "Recorded 1 category in the 'mapping' sheet",
            vec![MappingEntry::new("gym", "Sport")],
        );
        assert_eq!(out.message(), "Recorded 1 category in the 'mapping' sheet");
        assert_eq!(out.structure().map(Vec::len), Some(1));

        let out: Out<()> = "done".into();
        assert!(out.structure().is_none());
    }
}
