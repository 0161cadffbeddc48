//! Config file bodies modelled on distribution defaults.

/// Trimmed RHEL 8 style `sshd_config`: mostly commented-out defaults, a few
/// live settings, a `Match` block at the end.
pub const SSHD_CONFIG_RHEL: &str = "\
#\t$OpenBSD: sshd_config,v 1.103 2018/04/09 20:41:22 tj Exp $

# This is the sshd server system-wide configuration file.  See
# sshd_config(5) for more information.

#Port 22
#AddressFamily any
#ListenAddress 0.0.0.0

HostKey /etc/ssh/ssh_host_rsa_key
HostKey /etc/ssh/ssh_host_ecdsa_key
HostKey /etc/ssh/ssh_host_ed25519_key

# Ciphers and keying
#RekeyLimit default none

SyslogFacility AUTHPRIV
#LogLevel INFO

#LoginGraceTime 2m
PermitRootLogin yes
#StrictModes yes
#MaxAuthTries 6

#PermitEmptyPasswords no
PasswordAuthentication yes

X11Forwarding yes
#UseDNS no

Subsystem\tsftp\t/usr/libexec/openssh/sftp-server

# Example of overriding settings on a per-user basis
#Match User anoncvs
#\tX11Forwarding no
";

/// Debian-style `ssh_config` with a `Host *` block.
pub const SSH_CONFIG_DEBIAN: &str = "\
# This is the ssh client system-wide configuration file.  See
# ssh_config(5) for more information.

Host *
#   ForwardAgent no
#   PasswordAuthentication yes
#   Ciphers aes128-ctr,aes192-ctr,aes256-ctr,aes128-cbc,3des-cbc
#   MACs hmac-md5,hmac-sha1,umac-64@openssh.com
    SendEnv LANG LC_*
    HashKnownHosts yes
    GSSAPIAuthentication yes
";

/// A config with no recognizable directives at all.
pub const COMMENTS_ONLY: &str = "# nothing configured here\n\n# still nothing\n";
