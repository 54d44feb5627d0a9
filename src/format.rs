use crate::search::SearchResult;

/// Render a search result as a single markdown text block.
///
/// Pure function: same input, same output, no failure path. Optional
/// sections (sources, metadata, usage) are omitted entirely when absent so
/// the output never contains an empty heading.
pub fn format_search_result(result: &SearchResult) -> String {
    let mut output = format!("# Answer to: {}\n\n{}\n", result.query, result.answer);

    if !result.sources.is_empty() {
        output.push_str("\n## Sources\n\n");
        for source in &result.sources {
            output.push_str(&format!("[{}] **{}**\n", source.index, source.title));
            output.push_str(&format!("    URL: {}\n", source.url));
            if !source.snippet.is_empty() {
                output.push_str(&format!("    {}\n", source.snippet));
            }
            if let Some(provider) = &source.provider {
                output.push_str(&format!("    Provider: {}\n", provider));
            }
            output.push('\n');
        }
    }

    if let Some(metadata) = &result.metadata {
        output.push_str("\n## Search Metadata\n\n");
        output.push_str(&format!("- Iterations: {}\n", metadata.iterations));
        output.push_str(&format!(
            "- Providers used: {}\n",
            metadata.providers_used.join(", ")
        ));
        if let Some(total) = metadata.total_results {
            output.push_str(&format!("- Raw results: {}\n", total));
        }
        if let Some(deduplicated) = metadata.deduplicated_results {
            output.push_str(&format!("- After deduplication: {}\n", deduplicated));
        }
        output.push_str(&format!("- Paid APIs used: {}\n", metadata.paid_apis_used));
        if let Some(gaps) = &metadata.gaps_identified {
            if !gaps.is_empty() {
                output.push_str(&format!("- Gaps identified: {}\n", gaps.len()));
            }
        }
        if let Some(refined) = &metadata.refined_queries {
            if !refined.is_empty() {
                output.push_str(&format!("- Refined queries: {}\n", refined.len()));
            }
        }
        output.push_str(&format!("- Elapsed: {} ms\n", metadata.elapsed_time_ms));
    }

    if let Some(usage) = &result.usage {
        output.push_str("\n## Usage\n\n");
        output.push_str(&format!("- Credits charged: {}\n", usage.credits_charged));
        output.push_str(&format!(
            "- Credits remaining: {}\n",
            usage.credits_remaining
        ));
        output.push_str(&format!("- Plan: {}\n", usage.plan));
    }

    output
}
