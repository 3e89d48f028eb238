//! tests/splitter_tests.rs
//! Pruebas del text splitter.

#[cfg(test)]
mod tests {
    use crate::services::text_splitter::split_text;

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = split_text("Hola mundo", 1000, 0, true).expect("split");
        assert_eq!(chunks, vec!["Hola mundo".to_string()]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let text = "palabra ".repeat(500);
        let chunks = split_text(&text, 100, 0, true).expect("split");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100, "chunk demasiado largo: {}", chunk.len());
        }
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a".repeat(70), "b".repeat(70));
        let chunks = split_text(&text, 100, 0, true).expect("split");
        assert_eq!(chunks[0], "a".repeat(70));
        assert_eq!(chunks[1], "b".repeat(70));
    }

    #[test]
    fn test_character_overlap() {
        let text: String = ('a'..='z').collect();
        let chunks = split_text(&text, 10, 3, true).expect("split");
        assert_eq!(chunks[0], "abcdefghij");
        assert_eq!(chunks[1], "hijklmnopq");
        assert!(chunks.last().expect("last").ends_with('z'));
    }

    #[test]
    fn test_token_split_with_overlap() {
        let text = "uno dos tres cuatro cinco seis siete";
        let chunks = split_text(text, 3, 1, false).expect("split");
        assert_eq!(
            chunks,
            vec![
                "uno dos tres".to_string(),
                "tres cuatro cinco".to_string(),
                "cinco seis siete".to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        assert!(split_text("abc", 0, 0, true).is_err());
    }

    #[test]
    fn test_overlap_is_clamped() {
        let chunks = split_text("abcdef", 2, 10, true).expect("split");
        // overlap 1: avanza de a un caracter
        assert_eq!(chunks[0], "ab");
        assert_eq!(chunks[1], "bc");
        assert_eq!(chunks.last().map(String::as_str), Some("ef"));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "ñandú ".repeat(50);
        let chunks = split_text(&text, 25, 5, true).expect("split");
        assert!(chunks.iter().all(|c| c.chars().count() <= 25));
    }
}
