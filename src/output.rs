//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use crate::{AuthInfo, Feed, Field, Package, Product};

/// Trait for human-readable key-value output.
///
/// Implemented by entity types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Render a response field; explicit nulls are shown, unsent fields are not.
fn field_line<T, F: FnOnce(&T) -> String>(
    label: &str,
    field: &Field<T>,
    render: F,
) -> Option<String> {
    match field {
        Field::Unset => None,
        Field::Null => Some(format!("{label:<16}(null)")),
        Field::Value(v) => Some(format!("{label:<16}{}", render(v))),
    }
}

impl PrettyPrint for Product {
    fn pretty_print(&self) -> String {
        let header = format!("Product: {}", self.part_number().unwrap_or("<unknown>"));
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        let fields = [
            field_line("ID:", &self.id, String::clone),
            field_line("Name:", &self.name, String::clone),
            field_line("Family:", &self.family, String::clone),
            field_line("Workspace:", &self.workspace, String::clone),
            field_line("Keywords:", &self.keywords, |k| k.join(", ")),
            field_line("Properties:", &self.properties, |props| {
                let mut pairs: Vec<String> =
                    props.iter().map(|(k, v)| format!("{k}={v}")).collect();
                pairs.sort();
                pairs.join(", ")
            }),
            field_line("Files:", &self.file_ids, |ids| ids.len().to_string()),
            field_line("Created:", &self.created_at, |t| t.format(TIMESTAMP).to_string()),
            field_line("Updated:", &self.updated_at, |t| t.format(TIMESTAMP).to_string()),
        ];
        lines.extend(fields.into_iter().flatten());

        lines.join("\n")
    }
}

impl PrettyPrint for Feed {
    fn pretty_print(&self) -> String {
        let header = format!("Feed: {}", self.name);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![
            header,
            divider,
            format!("ID:             {}", self.id),
            format!("Platform:       {}", self.platform),
        ];

        if let Some(ref workspace) = self.workspace {
            lines.push(format!("Workspace:      {}", workspace));
        }

        if let Some(ref description) = self.description {
            lines.push(format!("Description:    {}", description));
        }

        if let Some(ref updated) = self.updated_at {
            lines.push(format!("Updated:        {}", updated.format(TIMESTAMP)));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Package {
    fn pretty_print(&self) -> String {
        let mut lines = vec![format!("Package: {}", self.file_name)];
        if let Some(ref metadata) = self.metadata {
            if let Some(ref version) = metadata.version {
                lines.push(format!("Version:        {}", version));
            }
        }
        lines.join("\n")
    }
}

impl PrettyPrint for AuthInfo {
    fn pretty_print(&self) -> String {
        let name = self
            .user
            .as_ref()
            .and_then(|u| u.display_name())
            .unwrap_or_else(|| "<unknown user>".to_string());
        let header = format!("User: {}", name);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        if let Some(email) = self.user.as_ref().and_then(|u| u.email.as_ref()) {
            lines.push(format!("Email:          {}", email));
        }

        if let Some(org) = self.org.as_ref().and_then(|o| o.name.as_ref()) {
            lines.push(format!("Org:            {}", org));
        }

        for workspace in &self.workspaces {
            let marker = if workspace.default == Some(true) { " (default)" } else { "" };
            lines.push(format!(
                "Workspace:      {} [{}]{}",
                workspace.name.as_deref().unwrap_or("-"),
                workspace.id.as_deref().unwrap_or("-"),
                marker
            ));
        }

        lines.join("\n")
    }
}
