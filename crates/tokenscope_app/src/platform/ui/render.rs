use tokenscope_core::{AppViewModel, ResultsView};

/// Projects the view model onto terminal lines.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if view.pending {
        lines.push(format!("Tokenizing with {} ...", view.summary));
    }

    match (&view.results, &view.error) {
        (Some(results), _) => {
            lines.push(format!("{} | {}", view.summary, results.count_label));
            lines.extend(render_rows(results));
        }
        (None, Some(error)) => lines.push(format!("error: {error}")),
        (None, None) if !view.pending => lines.push(format!("Tokenizer: {}", view.summary)),
        (None, None) => {}
    }

    lines
}

fn render_rows(results: &ResultsView) -> Vec<String> {
    let position_width = results
        .rows
        .iter()
        .map(|row| row.position.len())
        .max()
        .unwrap_or(0);
    let id_width = results
        .rows
        .iter()
        .filter_map(|row| row.id.as_ref().map(String::len))
        .max();

    results
        .rows
        .iter()
        .map(|row| match id_width {
            Some(id_width) => format!(
                "  {position:>pw$}  {id:>iw$}  {literal}",
                position = row.position,
                id = row.id.as_deref().unwrap_or(""),
                literal = row.literal,
                pw = position_width,
                iw = id_width,
            ),
            None => format!(
                "  {position:>pw$}  {literal}",
                position = row.position,
                literal = row.literal,
                pw = position_width,
            ),
        })
        .collect()
}
