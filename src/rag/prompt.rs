//! Prompt construction for answer generation

/// Returned instead of an answer when retrieval finds nothing
pub const NO_DOCUMENTS_MESSAGE: &str = "No relevant documents found to answer the query.";

/// System preamble sent with every answer request
pub const SYSTEM_PREAMBLE: &str =
    "You are a helpful assistant that answers questions based on the provided context.";

/// Build the user prompt from the retrieved chunk texts and the question
///
/// The chunk texts are joined with single spaces in retrieval order.
pub fn build_prompt<'a>(question: &str, documents: impl IntoIterator<Item = &'a str>) -> String {
    let context = documents.into_iter().collect::<Vec<_>>().join(" ");

    format!(
        "Use the following documents as context to answer the question.\n\
         If you cannot answer based on the context, say so.\n\
         \n\
         Context:\n\
         {}\n\
         \n\
         Question: {}\n\
         \n\
         Answer:",
        context, question
    )
}
