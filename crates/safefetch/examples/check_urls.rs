//! Example: Run URLs through validation and the SSRF guard
//!
//! Run with: cargo run -p safefetch --example check_urls
//!
//! Only public hostnames need DNS; every other case is decided offline.

use safefetch::{ErrorKind, FetchConfig, SafeFetcher};

/// Test case definition
struct TestCase {
    url: &'static str,
    description: &'static str,
    expect: Option<ErrorKind>,
}

/// Define test cases here
const TEST_CASES: &[TestCase] = &[
    TestCase {
        url: "https://example.com/page?q=1#frag",
        description: "Public hostname",
        expect: None,
    },
    TestCase {
        url: "file:///etc/passwd",
        description: "Disallowed scheme",
        expect: Some(ErrorKind::Validation),
    },
    TestCase {
        url: "https://blocked.example/",
        description: "Blocklisted domain",
        expect: Some(ErrorKind::Validation),
    },
    TestCase {
        url: "http://127.0.0.1/admin",
        description: "Loopback literal",
        expect: Some(ErrorKind::SsrfBlocked),
    },
    TestCase {
        url: "http://169.254.169.254/latest/meta-data/",
        description: "Cloud metadata endpoint",
        expect: Some(ErrorKind::SsrfBlocked),
    },
    TestCase {
        url: "http://[::ffff:10.0.0.1]/",
        description: "IPv4-mapped private address",
        expect: Some(ErrorKind::SsrfBlocked),
    },
    TestCase {
        url: "http://localhost:8080/",
        description: "Hostname resolving to loopback",
        expect: Some(ErrorKind::SsrfBlocked),
    },
];

#[tokio::main]
async fn main() {
    println!("SafeFetch URL Checks");
    println!("====================\n");

    let config = FetchConfig::builder()
        .block_domain("blocked.example")
        .build();
    let fetcher = match SafeFetcher::new(config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut passed = 0;
    let mut failed = 0;

    for (i, case) in TEST_CASES.iter().enumerate() {
        println!("{}. {}", i + 1, case.description);
        println!("   URL: {}", case.url);

        let outcome = fetcher.check(case.url).await;
        let kind = match &outcome {
            Ok(_) => {
                println!("   Allowed");
                None
            }
            Err(e) => {
                println!("   Refused: {}", e);
                Some(e.kind())
            }
        };

        if kind == case.expect {
            println!("   ✓ PASS\n");
            passed += 1;
        } else {
            println!("   ✗ FAIL (expected {:?})\n", case.expect);
            failed += 1;
        }
    }

    println!("====================");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}
