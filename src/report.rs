//! Formatting of raw command output into reply-sized reports.
//!
//! The parsers are line-oriented and lenient: rows that do not carry
//! enough fields are skipped, an empty result renders a placeholder.

/// Telegram message size limit.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Split a reply into consecutive chunks of at most
/// [`MAX_MESSAGE_LEN`] characters. Concatenating the chunks reproduces
/// the input; an empty input yields no chunks.
pub fn split_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let split_at = remaining
            .char_indices()
            .nth(MAX_MESSAGE_LEN)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        let (chunk, rest) = remaining.split_at(split_at);
        chunks.push(chunk.to_string());
        remaining = rest;
    }
    chunks
}

/// Login-history report from `last -i -n 10` output.
///
/// `reboot`/`shutdown` rows carry the kernel version where other rows
/// carry the originating host.
pub fn format_auths(raw: &str) -> String {
    let mut results = Vec::new();
    for line in raw.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 {
            continue;
        }
        let user = parts[0];
        if user == "reboot" || user == "shutdown" {
            let kernel = parts[2];
            let when = parts[3..parts.len().min(8)].join(" ");
            results.push(format!(
                "System reboot/shutdown (kernel {}): {}\n--",
                kernel, when
            ));
        } else {
            let host = parts[2];
            let when = parts[3..parts.len().min(7)].join(" ");
            results.push(format!("User: {}\nHost: {}\nTime: {}\n--", user, host, when));
        }
    }
    if results.is_empty() {
        "No recent login records.".to_string()
    } else {
        results.join("\n")
    }
}

/// Socket report from `ss -n` output. Rows without both a local and a
/// peer address are skipped along with the header.
pub fn format_sockets(raw: &str) -> String {
    let mut results = Vec::new();
    for line in raw.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 || parts[0] == "Netid" {
            continue;
        }

        let local = parts[4].contains(':').then_some(parts[4]);
        let peer = parts.get(5).copied().filter(|p| p.contains(':'));
        let (Some(local), Some(peer)) = (local, peer) else {
            continue;
        };

        results.push(format!(
            "Socket: {}\nState: {}\nLocal address: {}\nPeer address: {}\n--\n",
            parts[0], parts[1], local, peer
        ));
    }
    if results.is_empty() {
        "No socket data.".to_string()
    } else {
        results.join("\n")
    }
}

/// Service report from `systemctl list-units --type=service
/// --state=running` output. Parsing stops at the legend block.
pub fn format_services(raw: &str) -> String {
    let mut results = Vec::new();
    for line in raw.lines() {
        if line.starts_with("UNIT") || line.trim().is_empty() {
            continue;
        }
        if line.starts_with("Legend:") {
            break;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 || parts[1] == "LOAD" {
            continue;
        }

        results.push(format!(
            "Service: {}\nLoad: {}\nActive: {}\nSub: {}\nDescription: {}\n--",
            parts[0],
            parts[1],
            parts[2],
            parts[3],
            parts[4..].join(" ")
        ));
    }
    if results.is_empty() {
        "No running services found.".to_string()
    } else {
        results.join("\n")
    }
}

/// Lines of a log dump that mention replication, one reply each.
pub fn replication_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|line| line.contains("repl"))
        .map(|line| line.to_string())
        .collect()
}

/// `1. value` listing for stored-table dumps and extraction previews.
pub fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod chunking {
        use super::*;

        #[test]
        fn short_message_single_chunk() {
            let chunks = split_message("Hello, world!");
            assert_eq!(chunks, vec!["Hello, world!"]);
        }

        #[test]
        fn exact_boundary_single_chunk() {
            let msg = "a".repeat(MAX_MESSAGE_LEN);
            let chunks = split_message(&msg);
            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].len(), MAX_MESSAGE_LEN);
        }

        #[test]
        fn one_over_boundary_splits_in_two() {
            let msg = "a".repeat(MAX_MESSAGE_LEN + 1);
            let chunks = split_message(&msg);
            assert_eq!(chunks.len(), 2);
            assert_eq!(chunks[0].len(), MAX_MESSAGE_LEN);
            assert_eq!(chunks[1].len(), 1);
        }

        #[test]
        fn k_full_chunks_plus_remainder() {
            let msg = "x".repeat(MAX_MESSAGE_LEN * 3 + 500);
            let chunks = split_message(&msg);
            assert_eq!(chunks.len(), 4);
            assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_LEN));
            assert_eq!(chunks.concat(), msg);
        }

        #[test]
        fn multibyte_text_reassembles() {
            let msg = "я".repeat(MAX_MESSAGE_LEN + 10);
            let chunks = split_message(&msg);
            assert_eq!(chunks.len(), 2);
            assert_eq!(chunks[0].chars().count(), MAX_MESSAGE_LEN);
            assert_eq!(chunks.concat(), msg);
        }

        #[test]
        fn empty_message_no_chunks() {
            assert!(split_message("").is_empty());
        }
    }

    mod auths {
        use super::*;

        const SAMPLE: &str = "\
operator pts/0        203.0.113.7       Mon Aug  4 10:12   still logged in
reboot   system       5.15.0-76-generic Mon Aug  4 09:58   still running
operator pts/1        198.51.100.2      Sun Aug  3 22:40 - 23:05  (00:25)
short line";

        #[test]
        fn renders_user_and_reboot_records() {
            let report = format_auths(SAMPLE);
            assert!(report.contains("User: operator"));
            assert!(report.contains("Host: 203.0.113.7"));
            assert!(report.contains("System reboot/shutdown (kernel 5.15.0-76-generic)"));
        }

        #[test]
        fn skips_rows_with_too_few_fields() {
            let report = format_auths("short line\n");
            assert_eq!(report, "No recent login records.");
        }

        #[test]
        fn empty_output_renders_placeholder() {
            assert_eq!(format_auths(""), "No recent login records.");
        }
    }

    mod sockets {
        use super::*;

        const SAMPLE: &str = "\
Netid State  Recv-Q Send-Q Local Address:Port  Peer Address:Port
tcp   ESTAB  0      0      192.168.1.10:22     192.168.1.5:51234
udp   UNCONN 0      0      0.0.0.0:68          0.0.0.0:*
tcp   LISTEN 0      128    nolocal             nopeer";

        #[test]
        fn renders_rows_with_both_addresses() {
            let report = format_sockets(SAMPLE);
            assert!(report.contains("Socket: tcp"));
            assert!(report.contains("Local address: 192.168.1.10:22"));
            assert!(report.contains("Peer address: 192.168.1.5:51234"));
            assert!(report.contains("0.0.0.0:68"));
        }

        #[test]
        fn skips_header_and_addressless_rows() {
            let report = format_sockets(SAMPLE);
            assert!(!report.contains("Netid"));
            assert!(!report.contains("nolocal"));
        }

        #[test]
        fn empty_output_renders_placeholder() {
            assert_eq!(format_sockets(""), "No socket data.");
        }
    }

    mod services {
        use super::*;

        const SAMPLE: &str = "\
UNIT                  LOAD   ACTIVE SUB     DESCRIPTION
ssh.service           loaded active running OpenBSD Secure Shell server
cron.service          loaded active running Regular background program processing daemon

Legend: LOAD   = Reflects whether the unit definition was properly loaded.
2 loaded units listed.";

        #[test]
        fn renders_service_records() {
            let report = format_services(SAMPLE);
            assert!(report.contains("Service: ssh.service"));
            assert!(report.contains("Description: OpenBSD Secure Shell server"));
            assert!(report.contains("Service: cron.service"));
        }

        #[test]
        fn stops_at_legend() {
            let report = format_services(SAMPLE);
            assert!(!report.contains("Legend"));
            assert!(!report.contains("loaded units listed"));
        }

        #[test]
        fn empty_output_renders_placeholder() {
            assert_eq!(format_services(""), "No running services found.");
        }
    }

    #[test]
    fn replication_filter_keeps_matching_lines() {
        let raw = "starting up\nwalreceiver: repl stream ok\nidle\nrepl lag 0s\n";
        assert_eq!(
            replication_lines(raw),
            vec!["walreceiver: repl stream ok", "repl lag 0s"]
        );
    }

    #[test]
    fn numbered_list_is_one_based() {
        let items = vec!["first".to_string(), "second".to_string()];
        assert_eq!(numbered_list(&items), "1. first\n2. second");
    }
}
