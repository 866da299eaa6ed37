// Colored terminal output for trend reports and author clusters.
//
// This module handles all terminal-specific formatting: colors, tables,
// section headers. The main.rs display calls delegate here.

use colored::Colorize;

use crate::analyze::cluster::AuthorCluster;
use crate::analyze::report::TrendReport;

/// Display a full trend report in the terminal.
pub fn display_report(report: &TrendReport) {
    println!(
        "\n{}",
        format!(
            "=== Memecoin Trends Report ({} tweets) ===",
            report.total_tweets_analyzed
        )
        .bold()
    );
    println!("  Generated at: {}", report.report_generated_at.dimmed());
    println!();

    if report.overall_trending_words.is_empty() {
        println!("  No trending tokens - not enough data yet.");
    } else {
        println!(
            "  {:>4}  {:<20} {:>8}",
            "Rank".dimmed(),
            "Token".dimmed(),
            "Score".dimmed()
        );
        println!("  {}", "-".repeat(36).dimmed());
        for (i, (token, score)) in report.overall_trending_words.iter().enumerate() {
            println!("  {:>4}. {:<20} {:>8.1}", i + 1, token, score);
        }
    }

    if let Some(segment) = &report.author_segment {
        println!(
            "\n{}",
            format!("=== @{} ({} tweets) ===", segment.author, segment.records).bold()
        );
        println!(
            "  Mean likes: {:.1}   Mean retweets: {:.1}",
            segment.mean_likes, segment.mean_retweets
        );
        for (i, (token, score)) in segment.trending_words.iter().take(10).enumerate() {
            println!("  {:>4}. {:<20} {:>8.1}", i + 1, token, score);
        }
    }

    if !report.high_engagement_words.is_empty() {
        println!("\n{}", "=== High Engagement Words ===".bold());
        for (token, count) in &report.high_engagement_words {
            println!("  {:<20} {:>4}", token, count);
        }
    }

    match &report.monthly_trends {
        Some(months) if !months.is_empty() => {
            println!("\n{}", "=== Monthly Crypto Mentions ===".bold());
            for month in months {
                println!("  Month {}:", month.month);
                for (token, count) in &month.keywords {
                    println!("    {:<20} {:>4}", token, count);
                }
            }
        }
        Some(_) => {}
        None => {
            println!(
                "\n  {}",
                "Monthly breakdown unavailable - some timestamps failed to parse.".yellow()
            );
        }
    }

    println!();
}

/// Display K-means author clusters.
pub fn display_clusters(clusters: &[AuthorCluster]) {
    println!(
        "\n{}",
        format!("=== Author Clusters ({}) ===", clusters.len()).bold()
    );

    for cluster in clusters {
        let members = cluster
            .authors
            .iter()
            .map(|a| format!("@{a}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("\n  Cluster {}: {}", cluster.id, members.bold());
        println!("    {}", cluster.top_terms.join(" / ").dimmed());
    }
    println!();
}
