use docx_rs::{read_docx, DocumentChild, ParagraphChild, ReaderError, RunChild};

/// Returns the text of each top-level paragraph in document order.
/// Tables, headers and footers are not visited.
pub fn extract_paragraphs(bytes: &[u8]) -> Result<Vec<String>, ReaderError> {
    let docx = read_docx(bytes)?;

    let paragraphs = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => {
                let mut text = String::new();
                collect_runs(&p.children, &mut text);
                Some(text)
            }
            _ => None,
        })
        .collect();

    Ok(paragraphs)
}

fn collect_runs(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            // Link text (emails, profile URLs) lives inside hyperlink runs.
            ParagraphChild::Hyperlink(link) => collect_runs(&link.children, out),
            _ => {}
        }
    }
}
