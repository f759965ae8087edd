use owo_colors::OwoColorize;

use crate::engine::verify::{Severity, verify};
use crate::error::AppError;
use crate::prompt::Prompter;
use crate::sources::{HttpFetch, VersionSourceRegistry};
use crate::ui;

pub fn list<F>(registry: &VersionSourceRegistry<'_, F>) -> Result<(), AppError>
where
    F: HttpFetch + ?Sized,
{
    ui::title("version sources");
    let sources = registry.list()?;
    if sources.is_empty() {
        ui::warning("No version sources registered yet");
        return Ok(());
    }
    for source in sources {
        println!(
            "{} {} {}",
            source.name.cyan(),
            format!("({})", source.kind()).dimmed(),
            source.location
        );
    }
    println!();
    Ok(())
}

pub async fn add<F, P>(registry: &VersionSourceRegistry<'_, F>, prompter: &mut P) -> Result<(), AppError>
where
    F: HttpFetch + ?Sized,
    P: Prompter + ?Sized,
{
    ui::title("add version source");
    if let Some(source) = registry.prompt_and_add(prompter).await? {
        ui::success(format!(
            "Version source {} registered ({})",
            source.name,
            source.kind()
        ));
    }
    Ok(())
}

pub fn remove<F>(registry: &VersionSourceRegistry<'_, F>, name: &str) -> Result<(), AppError>
where
    F: HttpFetch + ?Sized,
{
    if registry.remove(name)? {
        ui::success(format!("Version source {name} removed"));
    } else {
        ui::warning(format!("No version source named {name}"));
    }
    Ok(())
}

pub async fn verify_source<F, P>(
    registry: &VersionSourceRegistry<'_, F>,
    prompter: &mut P,
) -> Result<(), AppError>
where
    F: HttpFetch + ?Sized,
    P: Prompter + ?Sized,
{
    ui::title("verify version source");
    let Some(location) = registry.select(prompter).await? else {
        return Ok(());
    };
    let source = registry.resolve(&location).await?;

    let issues = verify(&source);
    if issues.is_empty() {
        ui::success(format!("Version source at {location} verified without errors"));
        return Ok(());
    }

    println!(
        "Version source at {} has {}\n",
        location.blue(),
        format!("{} errors", issues.len()).red()
    );
    for issue in issues {
        let label = format!("{}:", issue.severity);
        match issue.severity {
            Severity::Low => println!("{} {} {}", label.black().on_white(), issue.path.cyan(), issue.message),
            Severity::High => println!(
                "{} {} {}",
                label.white().on_yellow(),
                issue.path.cyan(),
                issue.message.yellow()
            ),
            Severity::Critical => println!(
                "{} {} {}",
                label.white().on_red(),
                issue.path.cyan(),
                issue.message.red()
            ),
        }
    }
    println!();
    Ok(())
}
