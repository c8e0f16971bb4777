//! Menu-driven fallback for invocations without a subcommand.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::client::ApiClient;
use crate::models::CheckType;
use crate::nodes::NodeTable;
use crate::output::{self, OutputFormat};
use crate::render::Renderer;

pub async fn run(client: &ApiClient, table: &NodeTable) -> Result<()> {
    let renderer = Renderer::stdout();
    println!("=== Network Diagnostic Tool ===");

    loop {
        println!();
        println!("Options:");
        println!("1. Ping test");
        println!("2. HTTP test");
        println!("3. TCP test");
        println!("4. UDP test");
        println!("5. DNS resolution test");
        println!("0. Exit");

        let check = match prompt("Enter your choice: ")?.as_str() {
            "0" => break,
            "1" => CheckType::Ping,
            "2" => CheckType::Http,
            "3" => CheckType::Tcp,
            "4" => CheckType::Udp,
            "5" => CheckType::Dns,
            _ => {
                println!("Invalid choice. Please try again.");
                continue;
            }
        };

        let target = check.prepare_target(prompt(target_prompt(check))?);
        if target.is_empty() {
            println!("A target is required.");
            continue;
        }

        let results = match crate::check_from_everywhere(client, table, check, &target).await {
            Ok(results) => results,
            Err(e) => {
                eprintln!("Error: {e}");
                continue;
            }
        };

        renderer.print(check, &results);

        if prompt("\nSave results to file? (y/n): ")?.eq_ignore_ascii_case("y") {
            let filename = prompt("Enter filename: ")?;
            if filename.is_empty() {
                println!("No filename given, skipping save.");
                continue;
            }
            let format = match prompt("Format (json/text): ")?.to_lowercase().as_str() {
                "text" => OutputFormat::Text,
                _ => OutputFormat::Json,
            };
            match output::save(&results, Path::new(&filename), format) {
                Ok(()) => println!("Results saved to {filename}"),
                Err(e) => eprintln!("Error saving results: {e:#}"),
            }
        }
    }

    Ok(())
}

fn target_prompt(check: CheckType) -> &'static str {
    match check {
        CheckType::Ping => "Enter host to ping: ",
        CheckType::Http => "Enter URL to test (include http:// or https://): ",
        CheckType::Tcp | CheckType::Udp => "Enter host: ",
        CheckType::Dns => "Enter domain to resolve: ",
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}
