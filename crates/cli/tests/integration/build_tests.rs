use predicates::prelude::*;

use super::common::{HEADER, TestEnv, xbuild_cmd};

#[test]
#[cfg(unix)]
fn build_stages_then_archives() {
  let env = TestEnv::from_fixture("msf_gif.json");

  env
    .build_cmd("linux")
    .assert()
    .success()
    .stdout(predicate::str::contains("linux/linux/x64"))
    .stdout(predicate::str::contains(
      "summary: host=linux units=1 succeeded=1 failed=0 status=success",
    ));

  let staged = std::fs::read_to_string(env.root().join("msf_gif/msf_gif.c")).unwrap();
  assert_eq!(staged, HEADER);

  let archive = env.root().join("libs/linux/linux/x64/libmsf_gif.a");
  let members = std::fs::read_to_string(archive).unwrap();
  assert!(members.contains("build/linux/linux/x64/0_msf_gif.o"));
}

#[test]
#[cfg(unix)]
fn android_target_expands_to_four_archs() {
  let env = TestEnv::from_fixture("msf_gif.json");

  env
    .build_cmd("win32")
    .assert()
    .success()
    .stdout(predicate::str::contains("summary: host=win32 units=5 succeeded=5"));

  for arch in ["x86", "x86_64", "armeabi-v7a", "arm64-v8a"] {
    assert!(env.root().join("libs/win32/android").join(arch).join("libmsf_gif.a").is_file());
  }
  assert!(env.root().join("libs/win32/windows/x64/libmsf_gif.a").is_file());
  assert!(!env.root().join("libs/win32/windows/x86").exists());
}

#[test]
#[cfg(unix)]
fn rebuild_is_idempotent() {
  let env = TestEnv::from_fixture("msf_gif.json");

  env.build_cmd("linux").assert().success();
  env.build_cmd("linux").assert().success();

  let staged = std::fs::read_to_string(env.root().join("msf_gif/msf_gif.c")).unwrap();
  assert_eq!(staged, HEADER);
}

#[test]
#[cfg(unix)]
fn compiler_failure_exits_non_zero_and_reports_unit() {
  let env = TestEnv::from_fixture("msf_gif.json");
  let broken = env.broken_cc();

  env
    .build_cmd_with_cc("win32", &broken)
    .assert()
    .failure()
    .stdout(predicate::str::contains("failed=5 status=failure"))
    .stdout(predicate::str::contains("win32/android/armeabi-v7a [toolchain]"))
    .stdout(predicate::str::contains("msf_gif.c: fatal error"));
}

#[test]
#[cfg(unix)]
fn json_report_lists_units_in_order() {
  let env = TestEnv::from_fixture("msf_gif.json");

  let output = env.build_cmd("win32").arg("--output").arg("json").output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["host"], "win32");
  assert_eq!(json["success"], true);

  let ids: Vec<String> = json["units"]
    .as_array()
    .unwrap()
    .iter()
    .map(|u| format!("{}/{}", u["id"]["target"].as_str().unwrap(), u["id"]["arch"].as_str().unwrap()))
    .collect();
  assert_eq!(
    ids,
    vec![
      "android/x86",
      "android/x86_64",
      "android/armeabi-v7a",
      "android/arm64-v8a",
      "windows/x64"
    ]
  );
  assert!(json["units"].as_array().unwrap().iter().all(|u| u["status"] == "succeeded"));
}

#[test]
#[cfg(unix)]
fn missing_copy_source_fails_unit() {
  let env = TestEnv::from_fixture("msf_gif.json");
  std::fs::remove_file(env.root().join("msf_gif/msf_gif.h")).unwrap();

  env
    .build_cmd("linux")
    .assert()
    .failure()
    .stdout(predicate::str::contains("failed=1 status=failure"))
    .stdout(predicate::str::contains("linux/linux/x64 [source_not_found]"));
}

#[test]
fn unknown_host_fails_before_any_unit_runs() {
  let env = TestEnv::from_fixture("msf_gif.json");

  xbuild_cmd()
    .arg("build")
    .arg(&env.descriptor)
    .arg("--host")
    .arg("haiku")
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown host 'haiku'"));

  assert!(!env.root().join("msf_gif/msf_gif.c").exists());
  assert!(!env.root().join("libs").exists());
}

#[test]
fn empty_arch_list_is_fatal() {
  let env = TestEnv::from_fixture("no_archs.json");

  xbuild_cmd()
    .arg("build")
    .arg(&env.descriptor)
    .arg("--host")
    .arg("linux")
    .assert()
    .failure()
    .stderr(predicate::str::contains("empty arch list"));
}

#[test]
#[cfg(unix)]
fn host_can_come_from_environment() {
  let env = TestEnv::from_fixture("msf_gif.json");
  let (cc, ar) = (env.fake_cc(), env.fake_ar());

  xbuild_cmd()
    .arg("build")
    .arg(&env.descriptor)
    .arg("--cc")
    .arg(cc)
    .arg("--ar")
    .arg(ar)
    .env("XBUILD_HOST", "darwin")
    .assert()
    .success()
    .stdout(predicate::str::contains("darwin/macos/x64"));
}
