//! Command-line argument parsing for dstcheck

/// Parse command line arguments
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub validate: bool,
    pub help: bool,
    pub store: Option<String>,
}

pub fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from(&args)
}

/// Parse from an explicit argv (first element is the program name)
pub fn parse_args_from(args: &[String]) -> Args {
    let mut result = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--validate" => result.validate = true,
            "--help" | "-h" => result.help = true,
            "--store" => {
                if i + 1 < args.len() {
                    i += 1;
                    result.store = Some(args[i].clone());
                } else {
                    // --store without a value is a usage error
                    result.help = true;
                }
            }
            _ => {}
        }
        i += 1;
    }

    result
}

pub fn print_help() {
    println!("dstcheck - DST transition checker\n");
    println!("USAGE:");
    println!("    dstcheck [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --validate              Validate configuration and exit");
    println!("    --store PATH            Use PATH as the record store for this run");
    println!("    --help, -h              Show this help message\n");
    println!("ENVIRONMENT:");
    println!("    TRANSITION_BATCH        Handler run for imminent transitions (required)");
    println!("    TIMEZONEDB_API_KEY      TimeZoneDB API key (required)");
    println!("    DSTCHECK_STORE          Record store (default: sampleTimezone.json)");
    println!("    DSTCHECK_BACKUP         Backup path (default: <store>.backup)");
    println!("    DSTCHECK_CONFIG         Key-value config file (default: DSTTransitionChecker.config)");
    println!("    TOLERANCE_SECS          Classification window (default: 300)");
    println!("    PACING_DELAY_MS         Delay between records (default: 2000)");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("dstcheck")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args_default() {
        let result = parse_args_from(&argv(&[]));
        assert_eq!(result, Args::default());
    }

    #[test]
    fn test_parse_args_validate() {
        let result = parse_args_from(&argv(&["--validate"]));
        assert!(result.validate);
        assert!(!result.help);
    }

    #[test]
    fn test_parse_args_help() {
        assert!(parse_args_from(&argv(&["--help"])).help);
        assert!(parse_args_from(&argv(&["-h"])).help);
    }

    #[test]
    fn test_parse_args_store() {
        let result = parse_args_from(&argv(&["--store", "zones.json"]));
        assert_eq!(result.store, Some("zones.json".to_string()));
    }

    #[test]
    fn test_parse_args_store_without_value() {
        let result = parse_args_from(&argv(&["--store"]));
        assert!(result.help);
        assert!(result.store.is_none());
    }

    #[test]
    fn test_parse_args_multiple_flags() {
        let result = parse_args_from(&argv(&["--store", "a.json", "--validate", "--unknown"]));
        assert!(result.validate);
        assert_eq!(result.store, Some("a.json".to_string()));
    }
}
