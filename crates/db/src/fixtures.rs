use sqlx::{Executor, Row};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Deterministic demo university: two programs, three students, a dozen
/// courses with prerequisite chains, offerings over two terms, and a few
/// pre-existing enrollments (including passing grades for prerequisite
/// scenarios). Used by `cursus seed` and the end-to-end tests.
pub struct DemoDataset;

const SEED_SQL: &str = r#"
INSERT INTO programme (code, libelle) VALUES
  ('7316', 'Baccalauréat en informatique et génie logiciel'),
  ('7216', 'Baccalauréat en mathématiques');

INSERT INTO etudiant (code_permanent, nom, prenom, programme, statut) VALUES
  ('TREJ12345678', 'Tremblay', 'Julie', '7316', 'actif'),
  ('GAGM23456789', 'Gagnon', 'Marc', '7316', 'actif'),
  ('ROYS34567890', 'Roy', 'Sophie', '7216', 'actif');

INSERT INTO cours (sigle, titre, credits, departement, contenu, objectifs, prealables) VALUES
  ('INF1000', 'Programmation I', 3.0, 'Informatique',
   'Introduction à la programmation impérative, variables, structures de contrôle.',
   'Écrire des programmes simples et structurés.', ''),
  ('INF1062', 'Organisation des ordinateurs et assembleur', 3.0, 'Informatique',
   'Représentation des données, architecture des ordinateurs, langage assembleur.',
   'Comprendre le fonctionnement matériel d''un ordinateur.', ''),
  ('INF1120', 'Programmation II', 3.0, 'Informatique',
   'Programmation modulaire, récursivité, fichiers.',
   'Concevoir des programmes de taille moyenne.', 'INF1000'),
  ('INF2010', 'Structures de données', 3.0, 'Informatique',
   'Listes, piles, files, arbres, tables de hachage, analyse d''algorithmes.',
   'Choisir et implanter la bonne structure de données.', 'INF1000, MTH1000'),
  ('INF2120', 'Programmation orientée objet', 3.0, 'Informatique',
   'Classes, héritage, polymorphisme, patrons de conception élémentaires.',
   'Concevoir des logiciels orientés objet.', 'INF1120'),
  ('INF3105', 'Bases de données', 3.0, 'Informatique',
   'Modèle relationnel, SQL, conception de schémas, transactions.',
   'Concevoir et interroger une base de données relationnelle.', 'INF2010'),
  ('INF4100', 'Génie logiciel', 3.0, 'Informatique',
   'Cycle de vie du logiciel, exigences, tests, gestion de versions.',
   'Mener un projet logiciel en équipe.', 'INF2120'),
  ('MTH1000', 'Mathématiques discrètes', 4.0, 'Mathématiques',
   'Logique, ensembles, relations, preuves par induction, combinatoire.',
   'Maîtriser le raisonnement mathématique discret.', ''),
  ('MTH1200', 'Algèbre linéaire', 4.0, 'Mathématiques',
   'Espaces vectoriels, matrices, déterminants, valeurs propres.',
   'Résoudre des systèmes linéaires et diagonaliser des matrices.', ''),
  ('MTH2080', 'Probabilités', 3.0, 'Mathématiques',
   'Espaces de probabilité, variables aléatoires, lois usuelles.',
   'Modéliser des phénomènes aléatoires.', 'MTH1200'),
  ('PHY1001', 'Mécanique classique', 3.0, 'Physique',
   'Cinématique, dynamique, travail et énergie.',
   'Appliquer les lois de Newton.', ''),
  ('COM1005', 'Communication écrite et orale', 3.0, 'Communication',
   'Rédaction technique, présentations orales.',
   'Communiquer efficacement en contexte professionnel.', '');

INSERT INTO plan_formation (programme, sigle, trimestre_plan) VALUES
  ('7316', 'INF1000', 'Automne 2025'),
  ('7316', 'INF1062', 'Automne 2025'),
  ('7316', 'INF1120', 'Hiver 2026'),
  ('7316', 'INF2010', 'Hiver 2026'),
  ('7316', 'INF2120', 'Automne 2026'),
  ('7316', 'INF3105', 'Automne 2026'),
  ('7316', 'INF4100', 'Hiver 2027'),
  ('7316', 'MTH1000', 'Automne 2025'),
  ('7316', 'MTH1200', 'Hiver 2026'),
  ('7316', 'COM1005', 'Automne 2025'),
  ('7216', 'MTH1000', 'Automne 2025'),
  ('7216', 'MTH1200', 'Automne 2025'),
  ('7216', 'MTH2080', 'Hiver 2026'),
  ('7216', 'PHY1001', 'Hiver 2026'),
  ('7216', 'INF1000', 'Automne 2025');

INSERT INTO horaire (sigle, trimestre, groupe, jour, heure, local, enseignant) VALUES
  ('INF1000', 'Automne 2025', '01', 'Lundi', '9h30-12h30', 'PK-1140', 'R. Bélanger'),
  ('INF1000', 'Automne 2025', '02', 'Jeudi', '14h00-17h00', 'PK-1350', 'R. Bélanger'),
  ('INF1062', 'Automne 2025', '01', 'Mardi', '9h30-12h30', 'A-1750', 'P. Larochelle'),
  ('INF1120', 'Automne 2025', '01', 'Mercredi', '13h30-16h30', 'PK-1620', 'S. Nguyen'),
  ('MTH1000', 'Automne 2025', '01', 'Vendredi', '9h00-12h00', 'SH-2120', 'A. Bouchard'),
  ('MTH1200', 'Automne 2025', '01', 'Lundi', '13h30-16h30', 'SH-3260', 'C. Fortin'),
  ('COM1005', 'Automne 2025', '01', 'Jeudi', '9h30-12h30', 'DS-1545', 'M. Pelletier'),
  ('INF1062', 'Hiver 2026', '01', 'Mardi', '13h30-16h30', 'A-1750', 'P. Larochelle'),
  ('INF2010', 'Hiver 2026', '01', 'Lundi', '9h30-12h30', 'PK-1140', 'S. Nguyen'),
  ('INF2120', 'Hiver 2026', '01', 'Mercredi', '9h30-12h30', 'PK-1350', 'R. Bélanger'),
  ('INF3105', 'Hiver 2026', '01', 'Jeudi', '13h30-16h30', 'PK-1620', 'D. Lacasse'),
  ('MTH2080', 'Hiver 2026', '01', 'Vendredi', '13h00-16h00', 'SH-2120', 'A. Bouchard'),
  ('PHY1001', 'Hiver 2026', '01', 'Mardi', '9h00-12h00', 'SB-2405', 'J. Meunier');

INSERT INTO inscription (id, code_permanent, programme, trimestre_plan, sigle, trimestre, annee,
                         statut, date_inscription, note_finale) VALUES
  ('insc-julie-inf1000', 'TREJ12345678', '7316', 'Automne 2025', 'INF1000', 'Hiver 2025', 2025,
   'termine', '2025-01-06T13:00:00Z', 72.0),
  ('insc-julie-mth1000', 'TREJ12345678', '7316', 'Automne 2025', 'MTH1000', 'Hiver 2025', 2025,
   'termine', '2025-01-06T13:05:00Z', 81.0),
  ('insc-julie-mth1200', 'TREJ12345678', '7316', 'Hiver 2026', 'MTH1200', 'Automne 2025', 2025,
   'inscrit', '2025-07-15T12:00:00Z', NULL),
  ('insc-marc-inf1000', 'GAGM23456789', '7316', 'Automne 2025', 'INF1000', 'Automne 2025', 2025,
   'inscrit', '2025-07-20T09:30:00Z', NULL);
"#;

#[derive(Debug)]
pub struct SeedResult {
    pub students: i64,
    pub courses: i64,
    pub enrollments: i64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl DemoDataset {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::raw_sql(SEED_SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            students: count(pool, "etudiant").await?,
            courses: count(pool, "cours").await?,
            enrollments: count(pool, "inscription").await?,
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let expectations: &[(&str, &str, i64)] = &[
            ("programmes", "programme", 2),
            ("etudiants", "etudiant", 3),
            ("cours", "cours", 12),
            ("plan_formation", "plan_formation", 15),
            ("horaires", "horaire", 13),
            ("inscriptions", "inscription", 4),
        ];

        let mut checks = Vec::new();
        for (label, table, expected) in expectations {
            let actual = count(pool, table).await?;
            checks.push((*label, actual == *expected));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

async fn count(pool: &DbPool, table: &str) -> Result<i64, RepositoryError> {
    let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

#[cfg(test)]
mod tests {
    use crate::migrations;
    use crate::{connect_with_settings, DemoDataset};

    #[tokio::test]
    async fn demo_dataset_loads_and_verifies() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");

        let seeded = DemoDataset::load(&pool).await.expect("load dataset");
        assert_eq!(seeded.students, 3);
        assert_eq!(seeded.courses, 12);
        assert_eq!(seeded.enrollments, 4);

        let verification = DemoDataset::verify(&pool).await.expect("verify dataset");
        assert!(verification.all_present, "failed checks: {:?}", verification.checks);

        pool.close().await;
    }
}
