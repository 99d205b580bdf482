//  ██████╗██╗     ██╗
//  ██╔═══╝██║     ██║
//  ██║    ██║     ██║
//  ██║    ██║     ██║
//  ██████╗███████╗██║
//  ╚═════╝╚══════╝╚═╝
//
// CLI 参数校验的冒烟测试，不访问网络

use std::process::Command;

use assert_cmd::prelude::*;

mod passing {
    use super::*;

    #[test]
    fn help_describes_the_tool() {
        let out = Command::cargo_bin("pagedit")
            .unwrap()
            .arg("--help")
            .output()
            .unwrap();

        assert!(out.status.success());
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("Capture a web page"));
        assert!(stdout.contains("--mode"));
        assert!(stdout.contains("--wait"));
    }

    #[test]
    fn version_flag_works() {
        let out = Command::cargo_bin("pagedit")
            .unwrap()
            .arg("--version")
            .output()
            .unwrap();

        assert!(out.status.success());
        assert!(String::from_utf8_lossy(&out.stdout).contains("pagedit"));
    }
}

mod failing {
    use super::*;

    #[test]
    fn url_without_protocol_is_rejected_before_dispatch() {
        let out = Command::cargo_bin("pagedit")
            .unwrap()
            .arg("example.com")
            .output()
            .unwrap();

        assert!(!out.status.success());
        assert!(String::from_utf8_lossy(&out.stderr).contains("invalid URL"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let out = Command::cargo_bin("pagedit")
            .unwrap()
            .args(["https://example.com", "--mode", "screenshot"])
            .output()
            .unwrap();

        assert!(!out.status.success());
        assert!(String::from_utf8_lossy(&out.stderr).contains("unknown capture mode"));
    }

    #[test]
    fn missing_url_argument_fails() {
        let out = Command::cargo_bin("pagedit").unwrap().output().unwrap();

        assert!(!out.status.success());
    }
}
