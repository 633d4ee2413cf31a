//! The `browse` command: load contacts, open a cursor and print pages.

use crate::error::CliError;
use collation::Locale;
use engine_config::settings::CursorSettings;
use engine_core::error::CursorError;
use engine_runtime::{BookService, CursorMirror};
use model::{
    events::cursor::CursorEvent,
    filter::Filter,
    pagination::{
        sort::SortSpec,
        step::{StepFlags, StepOrigin, StepResult},
    },
    records::{field::ContactField, record::Record},
};
use std::path::Path;
use tokio::{runtime::Handle, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct BrowseOptions {
    pub contacts: String,
    pub settings: CursorSettings,
    pub sort: Vec<ContactField>,
    pub filter: Option<String>,
    pub page_size: u32,
    pub letter: Option<String>,
    pub switch_locale: Option<String>,
    pub json: bool,
}

pub async fn run(options: BrowseOptions, cancel: CancellationToken) -> Result<(), CliError> {
    let settings = options.settings.validate()?;
    let records = load_contacts(&options.contacts).await?;
    let filter = options.filter.as_deref().map(Filter::parse).transpose()?;

    let service = BookService::new(settings, Handle::current())?;
    for record in records {
        service.store().upsert(record).await?;
    }
    info!(
        contacts = service.store().len()?,
        locale = %service.store().locale()?,
        "Loaded address book"
    );

    let mut mirror = service
        .create_mirror(SortSpec::ascending(&options.sort), filter)
        .await?;
    let mut events = mirror.subscribe();

    let origin = match &options.letter {
        Some(letter) => {
            let index = find_label(&mirror.alphabet().labels, letter).ok_or_else(|| {
                CliError::UnknownLetter {
                    letter: letter.clone(),
                    locale: mirror.locale().to_string(),
                }
            })?;
            mirror.set_target_alphabetic_index(index).await?;
            wait_for_refresh(&mut events).await?;
            StepOrigin::Current
        }
        None => StepOrigin::Begin,
    };

    print_pages(&mut mirror, origin, &options, &cancel).await?;

    if let Some(next) = &options.switch_locale {
        let locale = Locale::parse(next)?;
        service.set_locale(locale).await?;
        wait_for_refresh(&mut events).await?;
        println!();
        println!("Locale switched to {}", mirror.locale());
        print_pages(&mut mirror, StepOrigin::Begin, &options, &cancel).await?;
    }

    mirror.free().await?;
    Ok(())
}

pub async fn load_contacts(path: impl AsRef<Path>) -> Result<Vec<Record>, CliError> {
    let source = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&source)?)
}

/// Index of the label matching `letter`, ignoring case. The underflow label
/// is never matched.
pub fn find_label(labels: &[String], letter: &str) -> Option<u32> {
    labels
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, label)| label.to_lowercase() == letter.to_lowercase())
        .map(|(i, _)| i as u32)
}

async fn wait_for_refresh(
    events: &mut mpsc::UnboundedReceiver<CursorEvent>,
) -> Result<(), CliError> {
    while let Some(event) = events.recv().await {
        debug!(%event, "cursor event");
        if event == CursorEvent::Refresh {
            return Ok(());
        }
    }
    Err(CursorError::Disconnected.into())
}

async fn print_pages(
    mirror: &mut CursorMirror,
    mut origin: StepOrigin,
    options: &BrowseOptions,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let flags = StepFlags::MOVE | StepFlags::FETCH;
    let page_size = options.page_size.max(1) as i32;
    let mut page_no = 1;

    loop {
        let first = match origin {
            StepOrigin::Begin => 1,
            _ => mirror.position() + 1,
        };
        let page = match mirror
            .step_with_retry(flags, origin, page_size, Some(cancel.clone()))
            .await
        {
            Ok(page) => page,
            Err(CursorError::QueryRefused { .. }) => break,
            Err(CursorError::Cancelled) => return Err(CliError::ShutdownRequested),
            Err(err) => return Err(err.into()),
        };

        if !page.records.is_empty() {
            if options.json {
                println!("{}", serde_json::to_string_pretty(&page.records)?);
            } else {
                print_table(page_no, first, mirror.total(), &page, &options.sort);
            }
        }

        if page.records.len() < page_size as usize {
            break;
        }
        origin = StepOrigin::Current;
        page_no += 1;
    }

    Ok(())
}

fn print_table(page_no: u32, first: u32, total: u32, page: &StepResult, sort: &[ContactField]) {
    println!("Page {page_no} ({total} contacts)");
    println!("-----------------------------");
    for (offset, record) in page.records.iter().enumerate() {
        let columns: Vec<&str> = sort.iter().map(|field| record.sort_value(*field)).collect();
        println!(
            "{:>5}  {:<40} {}",
            first + offset as u32,
            columns.join(", "),
            record.get(ContactField::Email).unwrap_or("")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_labels_ignoring_case() {
        let labels: Vec<String> = ["…", "A", "B", "Å"].map(String::from).into();
        assert_eq!(find_label(&labels, "b"), Some(2));
        assert_eq!(find_label(&labels, "å"), Some(3));
        assert_eq!(find_label(&labels, "…"), None);
        assert_eq!(find_label(&labels, "Z"), None);
    }

    #[tokio::test]
    async fn loads_contacts_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        std::fs::write(
            &path,
            r#"[{"uid": "a", "fields": {"family_name": "Müller", "email": "m@example.com"}}]"#,
        )
        .unwrap();

        let records = load_contacts(&path).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(ContactField::FamilyName), Some("Müller"));
    }

    #[tokio::test]
    async fn rejects_malformed_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load_contacts(&path).await,
            Err(CliError::ContactsParse(_))
        ));
    }
}
