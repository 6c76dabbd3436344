// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use std::{error::Error, fs, path::Path, process::Command};

// Add methods on commands
use assert_cmd::prelude::*;
use predicate::str;
use predicates::prelude::*;
use rcgen::{
    BasicConstraints, CertificateParams, DnType, IsCa, Issuer, KeyPair, KeyUsagePurpose,
};
use tempfile::TempDir;

struct Pki {
    ca_pem: String,
    chain_pem: String,
}

fn pki() -> Result<Pki, Box<dyn Error>> {
    let ca_key = KeyPair::generate()?;
    let mut ca_params = CertificateParams::new(Vec::<String>::new())?;
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "Device CA");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    let ca_pem = ca_params.self_signed(&ca_key)?.pem();

    let issuer = Issuer::from_params(&ca_params, &ca_key);
    let leaf_key = KeyPair::generate()?;
    let mut leaf_params = CertificateParams::new(vec!["device-1.example.com".to_string()])?;
    leaf_params
        .distinguished_name
        .push(DnType::CommonName, "device-1");
    let leaf_pem = leaf_params.signed_by(&leaf_key, &issuer)?.pem();

    Ok(Pki {
        chain_pem: format!("{leaf_pem}{ca_pem}"),
        ca_pem,
    })
}

fn write_config(dir: &Path, ca_pem: &str) -> Result<String, Box<dyn Error>> {
    let path = dir.join("devcert.toml");
    fs::write(
        &path,
        format!("[[trust_anchors]]\ncertificate = '''\n{ca_pem}'''\n"),
    )?;
    Ok(path.to_string_lossy().into_owned())
}

#[test]
fn no_arguments() -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("devcert-tool")?.assert().failure();
    Ok(())
}

#[test]
fn missing_config() -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("devcert-tool")?
        .env_remove("DEVCERT_CONFIG")
        .args(["anchors", "--config", "does/not/exist.toml"])
        .assert()
        .code(1)
        .stderr(str::contains("could not load configuration"));
    Ok(())
}

#[test]
fn anchors() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let pki = pki()?;
    let config = write_config(dir.path(), &pki.ca_pem)?;

    Command::cargo_bin("devcert-tool")?
        .args(["anchors", "--config", &config])
        .assert()
        .success()
        .stdout(str::contains("1 trust anchor(s)"))
        .stdout(str::contains("CN=Device CA"))
        .stdout(str::contains("ocsp: disabled"));
    Ok(())
}

#[test]
fn validate_accepted() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let pki = pki()?;
    let config = write_config(dir.path(), &pki.ca_pem)?;
    let chain = dir.path().join("chain.pem");
    fs::write(&chain, &pki.chain_pem)?;

    Command::cargo_bin("devcert-tool")?
        .env("DEVCERT_CONFIG", &config)
        .arg("validate")
        .arg("--chain")
        .arg(&chain)
        .assert()
        .success()
        .stdout(str::contains("accepted"));
    Ok(())
}

#[test]
fn validate_rejected() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let trusted = pki()?;
    let untrusted = pki()?;
    let config = write_config(dir.path(), &trusted.ca_pem)?;
    let chain = dir.path().join("chain.pem");
    fs::write(&chain, &untrusted.chain_pem)?;

    Command::cargo_bin("devcert-tool")?
        .args(["validate", "--config", &config, "--chain"])
        .arg(&chain)
        .assert()
        .code(3)
        .stdout(str::contains("rejected"));
    Ok(())
}

#[test]
fn validate_unreadable_chain() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let pki = pki()?;
    let config = write_config(dir.path(), &pki.ca_pem)?;
    let chain = dir.path().join("chain.pem");
    fs::write(&chain, "not a certificate")?;

    Command::cargo_bin("devcert-tool")?
        .args(["validate", "--config", &config, "--chain"])
        .arg(&chain)
        .assert()
        .code(1)
        .stderr(str::contains("could not parse chain"));
    Ok(())
}
