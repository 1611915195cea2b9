//! End-to-end pipeline tests over in-memory service fakes.
//!
//! Drives extract → clean → chunk → store → query → context → prompt
//! → generate through the public API, with the external services
//! (embedding, vector index, chat model, OCR) replaced by
//! deterministic fakes.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use fineduguide::chunk::chunk_text;
use fineduguide::clean::clean_text;
use fineduguide::context::{assemble_context, NO_RELEVANT_DOCUMENTS};
use fineduguide::embedding::TextEmbedder;
use fineduguide::error::PipelineError;
use fineduguide::extract::{extract_text, PdfMethod};
use fineduguide::generate::ChatModel;
use fineduguide::index::{VectorGateway, VectorIndex};
use fineduguide::models::{ChunkMetadata, EmbeddingRecord, RetrievalResult};
use fineduguide::ocr::{DisabledOcr, OcrEngine};
use fineduguide::prompt::{build_prompt, TaskType};
use fineduguide::query::parse_user_query;

// ============ Fakes ============

/// Deterministic embedder: a tiny bag-of-characters vector.
struct CountingEmbedder;

#[async_trait]
impl TextEmbedder for CountingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Ok(texts
            .iter()
            .map(|t| {
                let letters = t.chars().filter(|c| c.is_alphabetic()).count() as f32;
                let spaces = t.chars().filter(|c| *c == ' ').count() as f32;
                vec![letters, spaces, 1.0]
            })
            .collect())
    }
}

/// In-memory index: remembers upserts, serves queries by cosine
/// similarity over the stored vectors.
#[derive(Default)]
struct MemoryIndex {
    records: Mutex<Vec<EmbeddingRecord>>,
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, records: &[EmbeddingRecord]) -> Result<(), PipelineError> {
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>, PipelineError> {
        let records = self.records.lock().unwrap();
        let mut results: Vec<RetrievalResult> = records
            .iter()
            .map(|r| RetrievalResult {
                score: cosine(vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        results.truncate(top_k);
        Ok(results)
    }
}

/// Index fake returning a fixed result list regardless of the query
/// vector, in a deliberately non-descending score order.
struct CannedIndex {
    results: Vec<RetrievalResult>,
}

#[async_trait]
impl VectorIndex for CannedIndex {
    async fn upsert(&self, _records: &[EmbeddingRecord]) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>, PipelineError> {
        Ok(self.results.iter().take(top_k).cloned().collect())
    }
}

/// Chat fake that records invocations and echoes the model id.
struct RecordingChat {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatModel for RecordingChat {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        _temperature: f32,
    ) -> Result<String, PipelineError> {
        self.calls.lock().unwrap().push(model.to_string());
        Ok(format!("[{}] {} chars of prompt", model, prompt.len()))
    }
}

fn metadata(source: &str, index: usize, text: &str) -> ChunkMetadata {
    ChunkMetadata {
        source: source.to_string(),
        chunk_index: index,
        chunk_size: 1000,
        chunk_overlap: 200,
        text: text.to_string(),
    }
}

/// Minimal valid PDF containing the text "loan rate primer".
/// Builds body then xref with correct byte offsets so the extractor
/// can parse it.
fn minimal_pdf_with_phrase() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(b"4 0 obj << /Length 44 >> stream\nBT /F1 12 Tf 100 700 Td (loan rate primer) Tj ET\nendstream endobj\n");
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o1).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o2).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o3).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o4).as_bytes());
    out.extend_from_slice(format!("{:010} 00000 n \n", o5).as_bytes());
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

// ============ Tests ============

#[tokio::test]
async fn upload_small_text_file_yields_single_indexed_chunk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("interest.txt");
    let body = "Compound interest is interest on interest.\nIt grows faster than simple interest.";
    std::fs::write(&path, body).unwrap();

    // Extraction returns the file content unchanged.
    let text = extract_text(&path, None, &DisabledOcr).await.unwrap();
    assert_eq!(text, body);

    // Under 1000 characters: exactly one chunk, index 0.
    let cleaned = clean_text(&text);
    let chunks = chunk_text(&cleaned, "interest.txt", 1000, 200).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].metadata.chunk_index, 0);

    // Stored under "{source}_{index}" with full metadata payload.
    let index = Arc::new(MemoryIndex::default());
    let gateway = VectorGateway::new(Arc::new(CountingEmbedder), index.clone());
    assert!(gateway.store(&chunks).await.unwrap());

    let records = index.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "interest.txt_0");
    assert_eq!(records[0].metadata.text, chunks[0].text);
    assert_eq!(records[0].values.len(), 3);
}

#[tokio::test]
async fn stored_chunks_are_retrievable_by_similarity() {
    let index = Arc::new(MemoryIndex::default());
    let gateway = VectorGateway::new(Arc::new(CountingEmbedder), index);

    let text = "Savings accounts earn interest. Checking accounts rarely do. \
                Fixed deposits lock funds for a term in exchange for a higher rate.";
    let chunks = chunk_text(text, "accounts.txt", 80, 20).unwrap();
    assert!(chunks.len() > 1);
    gateway.store(&chunks).await.unwrap();

    let results = gateway.query("higher rate on fixed deposits", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    // The fake index already ranks descending; every score is a cosine in [0, 1].
    for result in &results {
        assert!(result.score >= 0.0 && result.score <= 1.0);
    }
}

#[tokio::test]
async fn retrieval_filters_by_threshold_and_reranks() {
    // The index answers in a non-descending order: [0.9, 0.3, 0.6].
    let index = CannedIndex {
        results: vec![
            RetrievalResult {
                score: 0.9,
                metadata: metadata("basics.txt", 0, "interest compounds each period"),
            },
            RetrievalResult {
                score: 0.3,
                metadata: metadata("basics.txt", 4, "unrelated filler text"),
            },
            RetrievalResult {
                score: 0.6,
                metadata: metadata("basics.txt", 2, "principal times rate"),
            },
        ],
    };
    let gateway = VectorGateway::new(Arc::new(CountingEmbedder), Arc::new(index));

    let results = gateway.query("What is compound interest?", 5).await.unwrap();
    let context = assemble_context(&results, 0.5);

    assert!(context.contains("interest compounds each period"));
    assert!(context.contains("principal times rate"));
    assert!(!context.contains("unrelated filler text"));
    // Assembler order is authoritative: 0.9 before 0.6.
    assert!(context.find("0.9000").unwrap() < context.find("0.6000").unwrap());
}

#[tokio::test]
async fn empty_retrieval_feeds_sentinel_context_into_prompt() {
    let gateway = VectorGateway::new(
        Arc::new(CountingEmbedder),
        Arc::new(MemoryIndex::default()),
    );

    let results = gateway.query("What is compound interest?", 5).await.unwrap();
    let context = assemble_context(&results, 0.5);
    assert_eq!(context, NO_RELEVANT_DOCUMENTS);

    // The sentinel is valid context, not an error.
    let prompt = build_prompt(&context, "What is compound interest?", TaskType::Explain);
    assert!(prompt.contains(NO_RELEVANT_DOCUMENTS));
}

#[tokio::test]
async fn generation_uses_the_task_model() {
    use fineduguide::config::ModelConfig;
    use fineduguide::generate::Generator;

    let chat = Arc::new(RecordingChat {
        calls: Mutex::new(Vec::new()),
    });
    let generator = Generator::new(chat.clone(), ModelConfig::default());

    let prompt = build_prompt("some context", "quiz me on loans", TaskType::Quiz);
    let output = generator.generate(&prompt, TaskType::Quiz).await.unwrap();

    assert!(output.starts_with("[gpt-4.1-nano]"));
    assert_eq!(chat.calls.lock().unwrap().as_slice(), ["gpt-4.1-nano"]);
}

#[test]
fn invalid_task_type_is_rejected_at_the_boundary() {
    let err = "banking".parse::<TaskType>().unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedTask(_)));
}

#[test]
fn short_query_is_rejected_before_retrieval() {
    let err = parse_user_query("<i>a</i>").unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[tokio::test]
async fn pdf_without_method_is_rejected_before_any_extraction() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("scan.pdf");
    std::fs::write(&path, minimal_pdf_with_phrase()).unwrap();

    // DisabledOcr would produce an upstream error if OCR were ever
    // attempted; the dispatch must fail first.
    let err = extract_text(&path, None, &DisabledOcr).await.unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn pdf_text_layer_extraction_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("primer.pdf");
    std::fs::write(&path, minimal_pdf_with_phrase()).unwrap();

    let text = extract_text(&path, Some(PdfMethod::Standard), &DisabledOcr)
        .await
        .unwrap();
    assert!(text.contains("loan rate primer"));

    let cleaned = clean_text(&text);
    let chunks = chunk_text(&cleaned, "primer.pdf", 1000, 200).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].metadata.source, "primer.pdf");
}

#[tokio::test]
async fn ocr_path_joins_page_tokens_with_spaces_and_newlines() {
    /// OCR fake returning fixed tokens per page.
    struct PageTokens;

    #[async_trait]
    impl OcrEngine for PageTokens {
        async fn recognize_page(
            &self,
            _document: &[u8],
            page: u32,
        ) -> Result<Vec<String>, PipelineError> {
            Ok(vec![format!("page{}", page), "tokens".to_string()])
        }
    }

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("scan.pdf");
    std::fs::write(&path, minimal_pdf_with_phrase()).unwrap();

    let text = extract_text(&path, Some(PdfMethod::Ocr), &PageTokens)
        .await
        .unwrap();
    assert_eq!(text, "page1 tokens\n");
}
