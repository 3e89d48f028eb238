//! services/text_splitter.rs
//! Divide documentos en chunks antes de calcular embeddings.

use anyhow::{anyhow, Result};

/// Divide `text` en chunks de a lo sumo `chunk_size` caracteres (o tokens de
/// whitespace si `by_characters` es false), con `overlap` de solapamiento.
pub fn split_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    by_characters: bool,
) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(anyhow!("chunkSize debe ser mayor que 0"));
    }
    // overlap >= chunk_size nunca avanzaría
    let overlap = overlap.min(chunk_size - 1);

    if by_characters {
        Ok(split_by_characters(text, chunk_size, overlap))
    } else {
        Ok(split_by_tokens(text, chunk_size, overlap))
    }
}

fn split_by_characters(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let hard_end = (start + chunk_size).min(total);
        let end = if hard_end < total {
            find_break(&chars[start..hard_end])
                .map(|offset| start + offset)
                .unwrap_or(hard_end)
        } else {
            hard_end
        };

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= total {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Busca el mejor punto de corte dentro de la ventana: párrafo, línea o espacio.
/// Sólo acepta cortes en la segunda mitad para no generar chunks diminutos.
fn find_break(window: &[char]) -> Option<usize> {
    let min_cut = window.len() / 2;

    let paragraph = (1..window.len())
        .rev()
        .find(|&i| window[i] == '\n' && window[i - 1] == '\n')
        .map(|i| i + 1);
    let line = window.iter().rposition(|&c| c == '\n').map(|i| i + 1);
    let space = window.iter().rposition(|c| c.is_whitespace()).map(|i| i + 1);

    [paragraph, line, space]
        .into_iter()
        .flatten()
        .find(|&cut| cut > min_cut)
}

fn split_by_tokens(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < tokens.len() {
        let end = (start + chunk_size).min(tokens.len());
        chunks.push(tokens[start..end].join(" "));
        if end == tokens.len() {
            break;
        }
        start += step;
    }

    chunks
}
