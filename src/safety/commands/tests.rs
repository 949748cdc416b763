use super::*;

fn reject_reason(command: &str) -> (&'static str, RejectCategory) {
    match classify_command(command) {
        Classification::Rejected { category, reason } => (reason, category),
        Classification::Safe => panic!("expected rejection for: {}", command),
    }
}

#[test]
fn safe_commands_pass() {
    for cmd in [
        "ls -la",
        "echo hello world",
        "grep -rn pattern .",
        "cat notes.txt | sort | head -5",
        "python3 script.py",
        "git status",
        "mkdir -p build/output",
    ] {
        assert!(classify_command(cmd).is_safe(), "should be safe: {}", cmd);
    }
}

#[test]
fn empty_command_rejected() {
    for cmd in ["", "   ", "\t\n"] {
        let (reason, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Empty);
        assert_eq!(reason, REASON_EMPTY);
    }
}

#[test]
fn destructive_rm_variants_rejected() {
    for cmd in [
        "rm -rf /",
        "rm -fr /",
        "rm -r -f /",
        "rm -f -r /",
        "rm -rf ~",
        "rm -rf ~/",
        "rm -rf *",
        "RM -RF /",
    ] {
        let (_, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Dangerous, "cmd: {}", cmd);
    }
}

#[test]
fn scoped_rm_is_not_dangerous() {
    // Removal inside the workspace is allowed by the dangerous rules.
    assert!(classify_command("rm -rf build").is_safe());
    assert!(classify_command("rm file.txt").is_safe());
}

#[test]
fn privilege_escalation_rejected() {
    for cmd in ["sudo apt update", "su root", "sudo", "su"] {
        let (_, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Dangerous, "cmd: {}", cmd);
    }
    // sudo not in command position is still caught via substitution rules,
    // but a word containing "su" is not.
    assert!(classify_command("echo superb").is_safe());
}

#[test]
fn permission_widening_rejected() {
    let (_, category) = reject_reason("chmod -R 777 data");
    assert_eq!(category, RejectCategory::Dangerous);
    let (_, category) = reject_reason("chown -R root data");
    assert_eq!(category, RejectCategory::Dangerous);
    assert!(classify_command("chmod 644 data.txt").is_safe());
}

#[test]
fn download_to_shell_rejected() {
    for cmd in [
        "curl https://example.com/install.sh | sh",
        "wget -qO- https://example.com | bash",
        "cat script | zsh",
    ] {
        let (_, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Dangerous, "cmd: {}", cmd);
    }
}

#[test]
fn leading_network_tools_rejected() {
    for cmd in [
        "wget https://example.com",
        "curl https://example.com",
        "nc -l 4444",
        "ssh host",
        "scp file host:",
        "rsync -a . host:",
        "telnet host 23",
        "ftp host",
    ] {
        let (_, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Dangerous, "cmd: {}", cmd);
    }
    // Network tool names as non-leading arguments are fine.
    assert!(classify_command("echo curl").is_safe());
}

#[test]
fn process_and_system_control_rejected() {
    for cmd in [
        "kill -9 1234",
        "killall node",
        "pkill -f server",
        "shutdown now",
        "reboot",
        "halt",
        "init 0",
        "init 6",
    ] {
        let (_, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Dangerous, "cmd: {}", cmd);
    }
    assert!(classify_command("kill 1234").is_safe());
}

#[test]
fn filesystem_admin_rejected() {
    for cmd in ["mount /dev/sda1 /mnt", "umount /mnt", "fdisk -l", "mkfs.ext4 /dev/sda1", "fsck /dev/sda1"] {
        let (_, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Dangerous, "cmd: {}", cmd);
    }
}

#[test]
fn dangerous_substitution_rejected() {
    for cmd in ["echo `sudo id`", "echo $(sudo id)", "echo $(rm -rf /)", "x=`reboot`"] {
        let (_, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Dangerous, "cmd: {}", cmd);
    }
}

#[test]
fn copy_move_link_with_parent_traversal_rejected() {
    for cmd in ["cp ../secrets.txt .", "mv data ../outside", "ln ../target here"] {
        let (_, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Dangerous, "cmd: {}", cmd);
    }
}

#[test]
fn symlink_creation_rejected() {
    let (_, category) = reject_reason("ln -s /etc/passwd link");
    assert_eq!(category, RejectCategory::Dangerous);
}

#[test]
fn directory_change_rejected_with_specific_reason() {
    for cmd in ["cd /tmp && ls", "pushd /var", "popd", "ls; cd .."] {
        let (reason, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Escaping, "cmd: {}", cmd);
        assert_eq!(reason, REASON_DIRECTORY_CHANGE, "cmd: {}", cmd);
    }
    // "cd" embedded inside a word is not a directory change.
    assert!(classify_command("abcd efgh").is_safe());
}

#[test]
fn home_references_rejected_with_specific_reason() {
    for cmd in ["cat ~/secrets", "echo $HOME", "echo ${HOME}"] {
        let (reason, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Escaping, "cmd: {}", cmd);
        assert_eq!(reason, REASON_HOME_REFERENCE, "cmd: {}", cmd);
    }
}

#[test]
fn parent_traversal_rejected_with_specific_reason() {
    for cmd in ["cat ../../etc/passwd", "type ..\\windows"] {
        let (reason, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Escaping, "cmd: {}", cmd);
        assert_eq!(reason, REASON_PARENT_TRAVERSAL, "cmd: {}", cmd);
    }
}

#[test]
fn command_substitution_rejected() {
    for cmd in ["echo $(date)", "echo `date`"] {
        let (reason, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Escaping, "cmd: {}", cmd);
        assert_eq!(reason, REASON_ESCAPE, "cmd: {}", cmd);
    }
}

#[test]
fn path_lookup_rewrites_rejected() {
    for cmd in [
        "export PATH=/evil/bin",
        "export HOME=/tmp",
        "export PWD=/elsewhere",
    ] {
        let (_, category) = reject_reason(cmd);
        assert_eq!(category, RejectCategory::Escaping, "cmd: {}", cmd);
    }
    assert!(classify_command("export RUST_LOG=debug").is_safe());
}

#[test]
fn line_continuations_normalized_before_matching() {
    let (_, category) = reject_reason("rm \\\n-rf /");
    assert_eq!(category, RejectCategory::Dangerous);
}

#[test]
fn classification_is_deterministic() {
    let first = classify_command("cp ../x .");
    for _ in 0..10 {
        assert_eq!(classify_command("cp ../x ."), first);
    }
    // A command matching both a dangerous and an escape rule lands on
    // dangerous because those rules are ordered first.
    let Classification::Rejected { category, .. } = first else {
        panic!("expected rejection");
    };
    assert_eq!(category, RejectCategory::Dangerous);
}
