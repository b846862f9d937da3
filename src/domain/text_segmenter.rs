//! 文本分割器
//!
//! 把提取出的全文切成按顺序播放的片段（chunk）

use serde::{Deserialize, Serialize};

/// 一个可播放的文本片段
///
/// 不变量:
/// - index 从 0 开始连续编号
/// - text 非空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
}

/// 检查是否为句末分隔符（换行也算）
#[inline]
fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '\n')
}

/// 候选片段是否全部由分隔符/空白组成（应该被丢弃）
#[inline]
fn is_trivial_candidate(s: &str) -> bool {
    s.chars().all(|c| is_terminator(c) || c.is_whitespace())
}

/// 按分隔符切出候选片段（不做过滤）
///
/// 每个候选 = 一段非分隔符字符 + 紧随其后的连续分隔符
fn split_candidates(text: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    let mut start = 0;
    let mut in_terminators = false;

    for (pos, ch) in text.char_indices() {
        if is_terminator(ch) {
            in_terminators = true;
        } else if in_terminators {
            candidates.push(&text[start..pos]);
            start = pos;
            in_terminators = false;
        }
    }

    if start < text.len() {
        candidates.push(&text[start..]);
    }

    candidates
}

/// 对文本进行分段
///
/// 分段策略：
/// 1. 按 `.` `!` `?` 和换行切分，分隔符保留在前一个片段末尾
/// 2. 丢弃只含空白或分隔符的片段
/// 3. 去掉首尾空白后按最终位置编号
pub fn segment_text(text: &str) -> Vec<TextChunk> {
    split_candidates(text)
        .into_iter()
        .filter(|candidate| !is_trivial_candidate(candidate))
        .map(str::trim)
        .enumerate()
        .map(|(index, text)| TextChunk {
            index,
            text: text.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[TextChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_terminator_stays_with_preceding_chunk() {
        let chunks = segment_text("Hello there. How are you? Fine!");
        assert_eq!(texts(&chunks), vec!["Hello there.", "How are you?", "Fine!"]);
    }

    #[test]
    fn test_newline_splits() {
        let chunks = segment_text("Chapter One\nIt was dark");
        assert_eq!(texts(&chunks), vec!["Chapter One", "It was dark"]);
    }

    #[test]
    fn test_consecutive_newlines_are_discarded() {
        let chunks = segment_text("\n\n\nFirst.\n\n\n\nSecond.\n\n");
        assert_eq!(texts(&chunks), vec!["First.", "Second."]);
    }

    #[test]
    fn test_terminator_runs_are_kept_together() {
        let chunks = segment_text("Wait... what?! Yes.");
        assert_eq!(texts(&chunks), vec!["Wait...", "what?!", "Yes."]);
    }

    #[test]
    fn test_leading_punctuation_is_dropped() {
        let chunks = segment_text("...and so it began.");
        assert_eq!(texts(&chunks), vec!["and so it began."]);
    }

    #[test]
    fn test_whitespace_only_input() {
        assert!(segment_text("").is_empty());
        assert!(segment_text("   \n \t \n").is_empty());
        assert!(segment_text("?!.\n").is_empty());
    }

    #[test]
    fn test_indices_are_contiguous_after_filtering() {
        let chunks = segment_text("One.\n\n  \nTwo.\n   \nThree");
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(chunks.iter().all(|c| !c.text.is_empty()));
    }

    #[test]
    fn test_text_without_terminator() {
        let chunks = segment_text("no punctuation at all");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "no punctuation at all");
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let text = "Um. Dois! Três?\nQuatro";
        assert_eq!(segment_text(text), segment_text(text));
    }

    #[test]
    fn test_multibyte_text() {
        let chunks = segment_text("Olá, você está aí? Sim. Ótimo!");
        assert_eq!(texts(&chunks), vec!["Olá, você está aí?", "Sim.", "Ótimo!"]);
    }
}
