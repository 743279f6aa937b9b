use keyword_parser::{parse, season_from_title};
use std::env;
use std::io::{self, BufRead};

fn main() {
    let args: Vec<String> = env::args().collect();

    let json_mode = args.iter().any(|a| a == "--json" || a == "-j");
    let season_mode = args.iter().any(|a| a == "--season" || a == "-s");
    let stdin_mode = args.iter().any(|a| a == "--stdin" || a == "-");

    let keywords: Vec<&String> = args
        .iter()
        .skip(1)
        .filter(|a| !a.starts_with('-'))
        .collect();

    if stdin_mode || keywords.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines().map_while(Result::ok) {
            let keyword = line.trim();
            if !keyword.is_empty() {
                process(keyword, json_mode, season_mode);
            }
        }
    } else {
        for keyword in keywords {
            process(keyword, json_mode, season_mode);
        }
    }
}

fn process(keyword: &str, json_mode: bool, season_mode: bool) {
    if season_mode {
        println!("{}\t{}", keyword, season_from_title(keyword));
        return;
    }

    let result = parse(keyword);
    if json_mode {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("JSON error: {}", e),
        }
    } else {
        println!("{}", keyword);
        println!("  title:   {}", result.title);
        match result.season {
            Some(s) => println!("  season:  {}", s),
            None => println!("  season:  -"),
        }
        match result.episode {
            Some(e) => println!("  episode: {}", e),
            None => println!("  episode: -"),
        }
    }
}
