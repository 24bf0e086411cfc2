use rfind::{AccelerationMode, DelegationPlanner, Finder, RfindError, SearchConfig, SearchConfigBuilder};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// `a.txt`, `b/` and `b/c.txt` under a canonical temporary root.
fn sample_tree() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::create_dir(root.join("b")).unwrap();
    fs::write(root.join("b").join("c.txt"), "c").unwrap();
    (dir, root)
}

fn in_process() -> SearchConfigBuilder {
    SearchConfig::builder().acceleration(AccelerationMode::Never)
}

fn search(root: &Path, builder: SearchConfigBuilder) -> BTreeSet<String> {
    let config = builder.build().unwrap();
    let planner = DelegationPlanner::disabled();
    Finder::new(root, &config, &planner)
        .collect()
        .unwrap()
        .into_iter()
        .collect()
}

fn set(paths: &[PathBuf]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string_lossy().into_owned()).collect()
}

#[test]
fn files_matching_suffix() {
    let (_guard, root) = sample_tree();
    let found = search(&root, in_process().pattern(r"\.txt$").include_directories(false));
    assert_eq!(found, set(&[root.join("a.txt"), root.join("b").join("c.txt")]));
}

#[test]
fn excluded_directory_is_pruned() {
    let (_guard, root) = sample_tree();
    let found = search(&root, in_process().pattern(r"\.txt$").exclude(root.join("b")));
    assert_eq!(found, set(&[root.join("a.txt")]));
}

#[test]
fn excluded_directory_still_matches_itself() {
    let (_guard, root) = sample_tree();
    let found = search(&root, in_process().exclude(root.join("b")));
    assert_eq!(found, set(&[root.clone(), root.join("a.txt"), root.join("b")]));
}

#[test]
fn exclusion_matches_by_identity_not_spelling() {
    let (_guard, root) = sample_tree();
    let roundabout = root.join("b").join("..").join("b");
    let found = search(&root, in_process().pattern("c.txt").exclude(roundabout));
    assert!(found.is_empty());
}

#[test]
fn excluded_root_lists_nothing_below() {
    let (_guard, root) = sample_tree();
    let found = search(&root, in_process().exclude(&root));
    assert_eq!(found, set(&[root.clone()]));
}

#[test]
fn single_level_window() {
    let (_guard, root) = sample_tree();
    let found = search(&root, in_process().min_depth(1).max_depth(1));
    assert_eq!(found, set(&[root.join("a.txt"), root.join("b")]));
}

#[test]
fn inverted_depth_window_is_empty() {
    let (_guard, root) = sample_tree();
    let found = search(&root, in_process().min_depth(2).max_depth(1));
    assert!(found.is_empty());
}

#[test]
fn zero_max_depth_yields_only_root() {
    let (_guard, root) = sample_tree();
    assert_eq!(search(&root, in_process().max_depth(0)), set(&[root.clone()]));
    assert!(search(&root, in_process().max_depth(0).include_directories(false)).is_empty());
    assert!(search(&root, in_process().max_depth(0).pattern("no-such-name")).is_empty());
}

#[test]
fn inverted_pattern_is_complement() {
    let (_guard, root) = sample_tree();
    let all = search(&root, in_process());
    let matching = search(&root, in_process().pattern(r"\.txt$"));
    let rest = search(&root, in_process().pattern(r"\.txt$").negated(true));

    assert!(matching.is_disjoint(&rest));
    let union: BTreeSet<_> = matching.union(&rest).cloned().collect();
    assert_eq!(union, all);
}

#[test]
fn delimited_pattern_with_flags() {
    let (_guard, root) = sample_tree();
    fs::write(root.join("LOUD.TXT"), "x").unwrap();
    let found = search(&root, in_process().pattern(r"/\.txt$/i").include_directories(false));
    assert_eq!(found.len(), 3);
    assert!(found.contains(&root.join("LOUD.TXT").to_string_lossy().into_owned()));
}

#[test]
fn relative_spelling_resolves_to_canonical_root() {
    let (_guard, root) = sample_tree();
    let spelled = root.join("b").join("..");
    let found = search(&spelled, in_process().pattern("c.txt"));
    assert_eq!(found, set(&[root.join("b").join("c.txt")]));
}

#[test]
fn missing_root_is_reported() {
    let (_guard, root) = sample_tree();
    let config = in_process().build().unwrap();
    let planner = DelegationPlanner::disabled();
    let err = Finder::new(root.join("absent"), &config, &planner)
        .collect()
        .unwrap_err();
    assert!(matches!(err, RfindError::RootNotFound { .. }));
}

#[test]
fn bad_pattern_fails_before_traversal() {
    let err = in_process().pattern("(unclosed").build().unwrap_err();
    assert!(matches!(err, RfindError::Pattern { ref pattern, .. } if pattern == "(unclosed"));
}

#[cfg(unix)]
mod links {
    use super::*;
    use rfind::OsInfo;
    use std::io;
    use std::os::unix::fs::symlink;

    #[test]
    fn link_is_emitted_but_not_entered() {
        let (_guard, root) = sample_tree();
        let elsewhere = TempDir::new().unwrap();
        let target = fs::canonicalize(elsewhere.path()).unwrap();
        fs::write(target.join("inner.txt"), "i").unwrap();
        symlink(&target, root.join("link")).unwrap();

        let found = search(&root, in_process());
        assert!(found.contains(&root.join("link").to_string_lossy().into_owned()));
        assert!(!found.iter().any(|p| p.contains("inner.txt")));
    }

    #[test]
    fn followed_link_contents_appear_once() {
        let (_guard, root) = sample_tree();
        let elsewhere = TempDir::new().unwrap();
        let target = fs::canonicalize(elsewhere.path()).unwrap();
        fs::write(target.join("inner.txt"), "i").unwrap();
        symlink(&target, root.join("link")).unwrap();

        let config = in_process().pattern("inner").follow_symlinks(true).build().unwrap();
        let planner = DelegationPlanner::disabled();
        let found = Finder::new(&root, &config, &planner).collect().unwrap();
        assert_eq!(
            found,
            vec![root.join("link").join("inner.txt").to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn cycle_is_bounded_by_max_depth() {
        let (_guard, root) = sample_tree();
        symlink(&root, root.join("loop")).unwrap();

        let found = search(
            &root,
            in_process().pattern("loop$").follow_symlinks(true).max_depth(3),
        );
        let once = root.join("loop");
        let twice = once.join("loop");
        let thrice = twice.join("loop");
        assert_eq!(found, set(&[once, twice, thrice]));
    }

    /// A platform without distinguishable links.
    struct NoLinks;

    impl OsInfo for NoLinks {
        fn supports_symlinks(&self) -> bool {
            false
        }

        fn is_symlink(&self, _path: &Path) -> io::Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn links_are_entered_where_the_platform_cannot_see_them() {
        let (_guard, root) = sample_tree();
        let elsewhere = TempDir::new().unwrap();
        let target = fs::canonicalize(elsewhere.path()).unwrap();
        fs::write(target.join("inner.txt"), "i").unwrap();
        symlink(&target, root.join("link")).unwrap();

        let config = in_process().pattern("inner").build().unwrap();
        let planner = DelegationPlanner::disabled();
        let found = Finder::new(&root, &config, &planner)
            .with_os(Box::new(NoLinks))
            .collect()
            .unwrap();
        assert_eq!(
            found,
            vec![root.join("link").join("inner.txt").to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn dangling_link_is_a_file() {
        let (_guard, root) = sample_tree();
        symlink(root.join("gone"), root.join("dangling")).unwrap();

        let files = search(&root, in_process().include_directories(false).pattern("dangling"));
        assert_eq!(files, set(&[root.join("dangling")]));
        let dirs = search(&root, in_process().include_files(false).pattern("dangling"));
        assert!(dirs.is_empty());
    }
}
