//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use autodox::{BackendError, Completion, CompletionBackend};
use futures::future::BoxFuture;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A model answer with every list populated and unsorted references.
pub const STRUCTURE_JSON: &str = r#"{
  "tableOfContents": [
    {"title": "BAB I Pendahuluan", "pageNumber": 1},
    {"title": "BAB II Tinjauan Pustaka", "pageNumber": 7}
  ],
  "figures": [{"title": "Gambar 2.1 Arsitektur Sistem", "pageNumber": 9}],
  "tables": [{"title": "Tabel 3.1 Hasil Uji", "pageNumber": 15}],
  "appendices": [{"title": "Lampiran A Kuesioner", "pageNumber": 40}],
  "references": [
    {"authors": "Wijaya, B.", "year": 2021, "title": "Sistem Informasi", "source": "Jurnal Teknik"},
    {"authors": "Anggraini, S.", "year": 2019, "title": "Basis Data", "source": "Informatika"},
    {"authors": "Wijaya, B.", "year": 2018, "title": "Rekayasa Perangkat Lunak", "source": "Andi"}
  ],
  "romanPageCount": 4
}"#;

/// Backend that always answers with the same text and counts its calls.
pub struct CannedBackend {
    answer: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl CannedBackend {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl CompletionBackend for CannedBackend {
    fn name(&self) -> &str {
        "canned"
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, BackendError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(Completion {
                content: self.answer.clone(),
                input_tokens: prompt.len() / 4,
                output_tokens: self.answer.len() / 4,
            })
        })
    }
}

/// Build a minimal `.docx` whose body holds one paragraph per line.
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// A small thesis-like document.
pub fn sample_docx() -> Vec<u8> {
    docx(&[
        "BAB I Pendahuluan",
        "Latar belakang penelitian ini.",
        "Gambar 2.1 Arsitektur Sistem",
        "Tabel 3.1 Hasil Uji",
        "Daftar Pustaka",
    ])
}
