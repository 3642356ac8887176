//! Text-level address substitution in a scrape-configuration document.
//!
//! These are pattern matches over the literal text, not a YAML round trip,
//! so comments and formatting survive untouched. The flip side: a document
//! laid out differently (other indentation, several targets per list,
//! comments between the anchor and the list) may not match at all. Callers
//! compare the output with the input to find out.

use regex::{Captures, Regex};

/// Replace the first static target listed under `job_name: <job>`. Only
/// that job's block, up to the next `- job_name:` line, is searched.
pub fn replace_job_target(config: &str, job: &str, new_target: &str) -> Result<String, regex::Error> {
    let anchor = Regex::new(&format!(
        r#"(?m)^[ \t]*- job_name:[ \t]*['"]?{}['"]?[ \t]*$"#,
        regex::escape(job)
    ))?;
    let Some(found) = anchor.find(config) else {
        return Ok(config.to_string());
    };
    let start = found.end();
    let next_job = Regex::new(r"(?m)^[ \t]*- job_name:")?;
    let end = next_job
        .find_at(config, start)
        .map_or(config.len(), |m| m.start());

    let target = Regex::new(r"(- targets:[ \t]*\n\s+- )(\S+)")?;
    let block = replace_first(&target, &config[start..end], new_target);
    Ok(format!("{}{block}{}", &config[..start], &config[end..]))
}

/// Replace the first target of the alert-router static configuration.
pub fn replace_alertmanager_target(config: &str, new_target: &str) -> Result<String, regex::Error> {
    let re = Regex::new(
        r"(alertmanagers:\s*\n\s+- static_configs:\s*\n\s+- targets:\s*\n\s+- )(\S+)",
    )?;
    Ok(replace_first(&re, config, new_target))
}

fn replace_first(re: &Regex, config: &str, new_target: &str) -> String {
    re.replacen(config, 1, |caps: &Captures| format!("{}{new_target}", &caps[1]))
        .into_owned()
}
