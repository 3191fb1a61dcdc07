use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::document::load_document;
use crate::generate::Generator;
use crate::prompt::assemble_prompt;
use crate::search_index::{IndexRecord, SearchIndex, SearchOptions};
use crate::splitter::{split_documents, SplitterConfig};

/// The retrieval-augmented SQL-generation pipeline: a search index for
/// schema chunks and a generation client, wired together by two straight-line
/// flows (index at startup, generate per question).
pub struct Pipeline<I, G> {
    index: I,
    generator: G,
    index_name: String,
    search_options: SearchOptions,
}

impl<I: SearchIndex, G: Generator> Pipeline<I, G> {
    pub fn new(index: I, generator: G, index_name: &str, search_options: SearchOptions) -> Self {
        Self {
            index,
            generator,
            index_name: index_name.to_string(),
            search_options,
        }
    }

    /// Startup flow: load the schema document, split it into chunks, make
    /// sure the index exists, and write every chunk as a record.
    ///
    /// A failure to write one record does not abort the rest; failures are
    /// counted and summarized. Returns the number of records written.
    pub async fn index_schema(
        &self,
        schema_file: &Path,
        splitter_config: &SplitterConfig,
    ) -> Result<usize> {
        let document = load_document(schema_file)?;
        let chunks = split_documents(&[document], splitter_config);
        info!(
            "Split schema file '{}' into {} chunks.",
            schema_file.display(),
            chunks.len()
        );

        self.index
            .ensure_index(&self.index_name)
            .await
            .context("failed to ensure the schema index exists")?;

        let mut indexed = 0;
        let mut failed = 0;
        for chunk in &chunks {
            let record = IndexRecord {
                page_content: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
            };
            match self.index.index(&self.index_name, &record).await {
                Ok(()) => indexed += 1,
                Err(e) => {
                    failed += 1;
                    error!("Failed to index chunk: {e}");
                }
            }
        }

        if failed > 0 {
            warn!("Indexing finished with {failed} of {} chunks failed.", chunks.len());
        } else {
            info!("Indexed {indexed} chunks into '{}'.", self.index_name);
        }
        Ok(indexed)
    }

    /// Query flow: retrieve matching schema chunks, assemble the prompt,
    /// and return the model's output unchanged.
    ///
    /// An unreachable index degrades to an empty context rather than
    /// failing the question; generation errors propagate.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let context = self.retrieve_context(question).await;
        let prompt = assemble_prompt(&context, question);
        self.generator.generate(&prompt).await
    }

    async fn retrieve_context(&self, question: &str) -> String {
        let hits = match self
            .index
            .search(&self.index_name, question, self.search_options)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Retrieval failed, answering without context: {e}");
                return String::new();
            }
        };
        hits.iter()
            .map(|h| h.page_content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::Pipeline;
    use crate::generate::fake::{EchoGenerator, FailingGenerator};
    use crate::search_index::fake::MemoryIndex;
    use crate::search_index::{SearchIndex, SearchOptions};
    use crate::splitter::SplitterConfig;

    const DDL: &str =
        "CREATE TABLE Employee (EmployeeID int, EmployeeName varchar(50));\n\
         CREATE TABLE EmployeeAbsence (EmployeeID int, AbsenceCode varchar(10), Duration int);\n";

    fn ddl_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{DDL}").unwrap();
        file
    }

    fn pipeline(index: MemoryIndex, size: usize) -> Pipeline<MemoryIndex, EchoGenerator> {
        Pipeline::new(index, EchoGenerator, "empindex", SearchOptions { size })
    }

    #[tokio::test]
    async fn index_schema_writes_every_chunk() {
        let file = ddl_file();
        let pipeline = pipeline(MemoryIndex::default(), 1);

        let config = SplitterConfig {
            chunk_size: 60,
            ..SplitterConfig::default()
        };
        let indexed = pipeline.index_schema(file.path(), &config).await.unwrap();
        assert!(indexed > 1);
        assert_eq!(pipeline.index.records("empindex").len(), indexed);

        // Every chunk carries the source path.
        for record in pipeline.index.records("empindex") {
            assert_eq!(
                record.metadata.get("source").map(String::as_str),
                Some(file.path().display().to_string().as_str())
            );
        }
    }

    #[tokio::test]
    async fn small_schema_is_a_single_record() {
        let file = ddl_file();
        let pipeline = pipeline(MemoryIndex::default(), 1);

        let indexed = pipeline
            .index_schema(file.path(), &SplitterConfig::default())
            .await
            .unwrap();
        assert_eq!(indexed, 1);
        assert_eq!(pipeline.index.records("empindex")[0].page_content, DDL);
    }

    #[tokio::test]
    async fn ask_substitutes_question_and_retrieved_context() {
        let file = ddl_file();
        let pipeline = pipeline(MemoryIndex::default(), 1);
        pipeline
            .index_schema(file.path(), &SplitterConfig::default())
            .await
            .unwrap();

        // The echo generator returns the prompt itself.
        let question = "How many employees are absent?";
        let prompt = pipeline.ask(question).await.unwrap();
        assert!(prompt.contains(question));
        assert!(prompt.contains("EmployeeAbsence"));
        assert!(prompt.contains("You are an MSSQL expert"));
    }

    #[tokio::test]
    async fn zero_hits_still_reaches_the_generator() {
        let index = MemoryIndex::default();
        index.ensure_index("empindex").await.unwrap();
        let pipeline = pipeline(index, 1);

        let prompt = pipeline.ask("unrelated words only").await.unwrap();
        assert!(prompt.contains("unrelated words only"));
        assert!(prompt.contains("Answer the question based on the following context:\n\n"));
    }

    #[tokio::test]
    async fn unreachable_index_degrades_to_empty_context() {
        let file = ddl_file();
        let pipeline = pipeline(MemoryIndex::default(), 1);
        pipeline
            .index_schema(file.path(), &SplitterConfig::default())
            .await
            .unwrap();

        pipeline.index.set_failing(true);
        let prompt = pipeline.ask("How many employees are absent?").await.unwrap();
        assert!(prompt.contains("How many employees are absent?"));
        assert!(!prompt.contains("CREATE TABLE"));
    }

    #[tokio::test]
    async fn generation_errors_propagate() {
        let index = MemoryIndex::default();
        index.ensure_index("empindex").await.unwrap();
        let pipeline = Pipeline::new(index, FailingGenerator, "empindex", SearchOptions::default());

        let err = pipeline.ask("anything").await.unwrap_err().to_string();
        assert!(err.contains("generation backend unreachable"));
    }

    #[tokio::test]
    async fn missing_schema_file_is_fatal_for_indexing() {
        let pipeline = pipeline(MemoryIndex::default(), 1);
        let result = pipeline
            .index_schema(
                std::path::Path::new("/nonexistent/employee_ddl.sql"),
                &SplitterConfig::default(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn failed_writes_are_counted_but_do_not_abort_indexing() {
        let file = ddl_file();
        let index = MemoryIndex::default();
        index.fail_indexing_after(1);
        let pipeline = pipeline(index, 1);

        let config = SplitterConfig {
            chunk_size: 60,
            ..SplitterConfig::default()
        };
        let total_chunks = crate::splitter::split_text(DDL, &config).len();
        assert!(total_chunks > 1);

        // Writes past the first fail, but the flow finishes and reports
        // only the successful ones.
        let indexed = pipeline.index_schema(file.path(), &config).await.unwrap();
        assert_eq!(indexed, 1);
        assert!(indexed < total_chunks);
        assert_eq!(pipeline.index.records("empindex").len(), 1);
    }

    #[tokio::test]
    async fn unreachable_backend_is_fatal_for_indexing() {
        let file = ddl_file();
        let index = MemoryIndex::default();
        index.set_failing(true);
        let pipeline = pipeline(index, 1);

        let result = pipeline
            .index_schema(file.path(), &SplitterConfig::default())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn reindexing_doubles_the_records() {
        let file = ddl_file();
        let pipeline = pipeline(MemoryIndex::default(), 1);

        let config = SplitterConfig::default();
        let first = pipeline.index_schema(file.path(), &config).await.unwrap();
        let second = pipeline.index_schema(file.path(), &config).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(pipeline.index.records("empindex").len(), first + second);
    }

    #[tokio::test]
    async fn multiple_hits_are_joined_in_order() {
        let index = MemoryIndex::default();
        index.ensure_index("empindex").await.unwrap();
        let pipeline = pipeline(index, 5);
        for text in [
            "CREATE TABLE Employee (EmployeeName varchar(50));",
            "CREATE TABLE EmployeeAbsence (Duration int);",
        ] {
            pipeline
                .index
                .index(
                    "empindex",
                    &crate::search_index::IndexRecord {
                        page_content: text.to_string(),
                        metadata: std::collections::HashMap::new(),
                    },
                )
                .await
                .unwrap();
        }

        let prompt = pipeline.ask("Employee").await.unwrap();
        assert!(prompt.contains("EmployeeName"));
        assert!(prompt.contains("Duration"));
    }
}
